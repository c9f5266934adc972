//! Candidate transformation
//!
//! Turns a decoded provider [`Payload`] into completion matches. The rules are
//! simple string heuristics that follow provider conventions:
//!
//! - the inserted text is the part of the value after the last `=` (only while
//!   completing an option value), then after the last `,`, then after the
//!   last `;`
//! - the kind comes from the suffix of the candidate's tag
//! - trailing whitespace is suppressed for `nospace` characters, for
//!   `nospace = "all"`, and for yellow-styled values starting with `-`

use nu_ansi_term::Style;
use tracing::debug;

use super::host::PathLookup;
use super::payload::{CandidateSpec, Payload};
use super::style::{StyleResolver, is_yellow};

/// How a match should be treated by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Word,
    Arg,
    File,
    Dir,
}

impl CompletionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionKind::Word => "word",
            CompletionKind::Arg => "arg",
            CompletionKind::File => "file",
            CompletionKind::Dir => "dir",
        }
    }
}

/// A UI-ready completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionMatch {
    /// Text inserted on selection
    pub text: String,
    /// Text shown in the list, prefixed with the style escape when styled
    pub display: String,
    pub description: String,
    pub kind: CompletionKind,
    /// No whitespace should follow the inserted text
    pub suppress_append: bool,
    /// Resolved candidate style
    pub style: Option<Style>,
}

impl CompletionMatch {
    /// Display text without the style escape.
    pub fn plain_display(&self) -> &str {
        match self.style {
            Some(style) => {
                let prefix = style.prefix().to_string();
                self.display.strip_prefix(prefix.as_str()).unwrap_or(&self.display)
            }
            None => &self.display,
        }
    }
}

/// Inputs the transformation needs beyond the payload.
pub struct TransformContext<'a> {
    /// The word under the cursor is an `=`-joined option value
    pub split_equals: bool,
    pub styles: &'a dyn StyleResolver,
    pub paths: &'a dyn PathLookup,
}

/// Result of a transformation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformed {
    pub matches: Vec<CompletionMatch>,
    /// Provider message to show instead of matches
    pub diagnostic: Option<String>,
}

const NOSPACE_ALL: &str = "all";

/// Transform `payload` into matches.
///
/// # Arguments
/// * `payload` - Decoded provider document
/// * `ctx` - Completion context and host collaborators
///
/// # Returns
/// * `Transformed` - Matches, or a diagnostic when the provider sent messages
pub fn transform(payload: Payload, ctx: &TransformContext<'_>) -> Transformed {
    if let Some(message) = payload.messages.into_iter().next() {
        debug!(message = %message, "Provider returned a message");
        return Transformed {
            matches: Vec::new(),
            diagnostic: Some(message),
        };
    }

    let nospace = payload.nospace.unwrap_or_default();
    let matches = payload
        .values
        .into_iter()
        .filter_map(|spec| to_match(spec, &nospace, ctx))
        .collect();

    Transformed {
        matches,
        diagnostic: None,
    }
}

fn to_match(spec: CandidateSpec, nospace: &str, ctx: &TransformContext<'_>) -> Option<CompletionMatch> {
    let text = derive_text(&spec.value, ctx.split_equals);
    if text.is_empty() {
        return None;
    }

    let plain_display = match spec.display {
        Some(display) if !display.is_empty() => display,
        _ => text.to_string(),
    };

    let kind = classify(spec.tag.as_deref().unwrap_or(""), &plain_display, text, ctx.paths);
    let style = spec.style.as_deref().and_then(|name| ctx.styles.resolve(name));

    let suppress_append = nospace == NOSPACE_ALL
        || style.is_some_and(|s| is_yellow(&s) && text.starts_with('-'))
        || text.chars().last().is_some_and(|c| nospace.contains(c));

    let display = match style {
        Some(s) => format!("{}{}", s.prefix(), plain_display),
        None => plain_display,
    };

    Some(CompletionMatch {
        text: text.to_string(),
        display,
        description: spec.description.unwrap_or_default(),
        kind,
        suppress_append,
        style,
    })
}

/// Part of `value` inserted on selection.
pub fn derive_text(value: &str, split_equals: bool) -> &str {
    let mut text = value;
    if split_equals {
        if let Some((_, rest)) = text.rsplit_once('=') {
            text = rest;
        }
    }
    for separator in [',', ';'] {
        if let Some((_, rest)) = text.rsplit_once(separator) {
            text = rest;
        }
    }
    text
}

fn classify(tag: &str, display: &str, text: &str, paths: &dyn PathLookup) -> CompletionKind {
    if tag.ends_with("files") || tag.ends_with("directories") {
        if display.ends_with(['/', '\\']) {
            CompletionKind::Dir
        } else {
            CompletionKind::File
        }
    } else if tag.ends_with("flags") || tag.ends_with("commands") {
        CompletionKind::Arg
    } else if tag.ends_with("changes") {
        if paths.is_dir(text) {
            CompletionKind::Dir
        } else {
            CompletionKind::File
        }
    } else {
        CompletionKind::Word
    }
}
