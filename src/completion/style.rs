//! Style names to terminal styles
//!
//! Providers attach a style to candidates as a space-separated list of
//! words, for example `"bold fg-yellow"` or `"bg-blue bright-white"`.

use nu_ansi_term::{Color, Style};

/// Turns a provider style name into a terminal style.
pub trait StyleResolver: Send + Sync {
    /// Resolve `name`, or `None` if any part of it is unknown.
    fn resolve(&self, name: &str) -> Option<Style>;
}

/// Resolver understanding color names, attributes and `#rrggbb`.
///
/// Recognized words:
/// - attributes: `bold`, `dim`, `italic`, `underlined`/`underline`,
///   `blink`, `inverse`/`reverse`, `hidden`, `strikethrough`
/// - colors: `black`, `red`, `green`, `yellow`, `blue`, `magenta`/`purple`,
///   `cyan`, `white`, `gray`/`grey`, each optionally prefixed `bright-`
/// - `#rrggbb` true colors
/// - `fg-` and `bg-` prefixes selecting foreground or background
/// - `default`, which changes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedStyles;

impl StyleResolver for NamedStyles {
    fn resolve(&self, name: &str) -> Option<Style> {
        let mut style = Style::new();
        let mut words = name.split_whitespace().peekable();
        words.peek()?;

        for word in words {
            let word = word.to_ascii_lowercase();
            style = match word.as_str() {
                "default" => style,
                "bold" => style.bold(),
                "dim" => style.dimmed(),
                "italic" => style.italic(),
                "underlined" | "underline" => style.underline(),
                "blink" => style.blink(),
                "inverse" | "reverse" => style.reverse(),
                "hidden" => style.hidden(),
                "strikethrough" => style.strikethrough(),
                other => match other.strip_prefix("bg-") {
                    Some(color) => style.on(parse_color(color)?),
                    None => style.fg(parse_color(other.strip_prefix("fg-").unwrap_or(other))?),
                },
            };
        }

        Some(style)
    }
}

fn parse_color(name: &str) -> Option<Color> {
    if let Some(hex) = name.strip_prefix('#') {
        return parse_hex(hex);
    }

    let color = match name {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "purple" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "bright-black" => Color::DarkGray,
        "bright-red" => Color::LightRed,
        "bright-green" => Color::LightGreen,
        "bright-yellow" => Color::LightYellow,
        "bright-blue" => Color::LightBlue,
        "bright-magenta" => Color::LightMagenta,
        "bright-purple" => Color::LightPurple,
        "bright-cyan" => Color::LightCyan,
        "bright-white" => Color::LightGray,
        _ => return None,
    };
    Some(color)
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Whether `style` uses the yellow foreground providers give flag values.
pub fn is_yellow(style: &Style) -> bool {
    matches!(style.foreground, Some(Color::Yellow | Color::LightYellow))
}
