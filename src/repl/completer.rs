//! Completer for reedline backed by the completion dispatcher

use std::sync::Arc;

use reedline::{Completer, Span, Suggestion};
use tokio::runtime::Handle;
use tracing::debug;

use crate::completion::{CompletionOutcome, DispatchResult, Dispatcher, LineState, PopupBuffer};

/// Bridges reedline's synchronous completer to the async dispatcher
pub struct BridgeCompleter {
    /// Dispatcher serving completion requests
    dispatcher: Arc<Dispatcher>,
    /// Messages the dispatcher shows instead of matches
    popups: PopupBuffer,
}

impl BridgeCompleter {
    /// Create a new completer
    ///
    /// # Arguments
    /// * `dispatcher` - Dispatcher serving completion requests
    /// * `popups` - Notifier buffer the dispatcher writes to
    ///
    /// # Returns
    /// * `Self` - New completer
    pub fn new(dispatcher: Arc<Dispatcher>, popups: PopupBuffer) -> Self {
        Self { dispatcher, popups }
    }
}

impl Completer for BridgeCompleter {
    /// Complete the input at the given cursor position
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - List of completion suggestions
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let state = LineState::parse(line, pos);

        // Requires a multi-threaded runtime
        let Ok(handle) = Handle::try_current() else {
            debug!("No async runtime, provider completion skipped");
            return Vec::new();
        };
        let dispatcher = Arc::clone(&self.dispatcher);
        let result = tokio::task::block_in_place(|| handle.block_on(dispatcher.complete(&state)));

        to_suggestions(line, &state, result, self.popups.take())
    }
}

/// Convert a dispatch result into reedline suggestions.
///
/// Popup messages become a single suggestion that leaves the line unchanged
/// and carries the message as its description.
pub fn to_suggestions(
    line: &str,
    state: &LineState,
    result: DispatchResult,
    popups: Vec<String>,
) -> Vec<Suggestion> {
    match result.outcome {
        CompletionOutcome::NoMatches => Vec::new(),
        CompletionOutcome::Handled => {
            if popups.is_empty() {
                return Vec::new();
            }
            let start = state.completion_start();
            vec![Suggestion {
                value: line[start..state.cursor()].to_string(),
                description: Some(popups.join("; ")),
                style: None,
                extra: None,
                span: Span::new(start, state.cursor()),
                append_whitespace: false,
                match_indices: None,
            }]
        }
        CompletionOutcome::Matches(matches) => {
            let span = Span::new(state.replacement_start(), state.cursor());
            matches
                .into_iter()
                .map(|m| Suggestion {
                    description: (!m.description.is_empty()).then_some(m.description),
                    style: m.style,
                    extra: None,
                    span,
                    append_whitespace: !m.suppress_append,
                    match_indices: None,
                    value: m.text,
                })
                .collect()
        }
    }
}
