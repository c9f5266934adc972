//! Prompt for the demo shell

use std::borrow::Cow;

use nu_ansi_term::{Color, Style};
use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Prompt showing the provider in use
pub struct BridgePrompt {
    /// Provider executable name
    provider: String,
    /// Whether provider completion is enabled
    enabled: bool,
    /// Colorize the prompt
    color: bool,
}

impl BridgePrompt {
    /// Create a new prompt
    ///
    /// # Arguments
    /// * `provider` - Provider executable name
    /// * `enabled` - Whether provider completion is enabled
    /// * `color` - Colorize the prompt
    pub fn new(provider: impl Into<String>, enabled: bool, color: bool) -> Self {
        Self {
            provider: provider.into(),
            enabled,
            color,
        }
    }

    fn label(&self) -> String {
        if self.enabled {
            format!("[{}]", self.provider)
        } else {
            format!("[{} off]", self.provider)
        }
    }
}

impl Prompt for BridgePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let label = self.label();
        if !self.color {
            return format!("{}> ", label).into();
        }

        let style = if self.enabled {
            Style::new().fg(Color::Green)
        } else {
            Style::new().fg(Color::DarkGray)
        };
        format!("{}> ", style.paint(label)).into()
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        "... ".into()
    }

    /// Render the history search prompt
    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompt() {
        let prompt = BridgePrompt::new("carapace", true, false);
        assert_eq!(prompt.render_prompt_left(), "[carapace]> ");

        let prompt = BridgePrompt::new("carapace", false, false);
        assert_eq!(prompt.render_prompt_left(), "[carapace off]> ");
    }

    #[test]
    fn test_colored_prompt() {
        let prompt = BridgePrompt::new("carapace", true, true);
        let rendered = prompt.render_prompt_left();
        assert!(rendered.starts_with('\u{1b}'));
        assert!(rendered.contains("[carapace]"));
    }

    #[test]
    fn test_right_prompt_and_indicator_empty() {
        let prompt = BridgePrompt::new("carapace", true, false);
        assert_eq!(prompt.render_prompt_right(), "");
        assert_eq!(prompt.render_prompt_indicator(PromptEditMode::Default), "");
        assert_eq!(prompt.render_prompt_multiline_indicator(), "... ");
    }
}
