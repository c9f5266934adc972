//! Demo shell
//!
//! A reedline line editor whose completion menu is filled by the provider
//! bridge. Submitted lines are echoed back rather than executed.

mod completer;
mod engine;
mod prompt;

pub use completer::{BridgeCompleter, to_suggestions};
pub use engine::ReplEngine;
pub use prompt::BridgePrompt;
