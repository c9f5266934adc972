//! compbridge library
//!
//! Integrates an external, self-describing completion provider into an
//! interactive shell. For each completion request the provider is started
//! with the command line being typed, its JSON output is collected under a
//! timeout, and the result is turned into typed completion matches.
//!
//! # Modules
//!
//! - `codec`: JSON encoder and decoder
//! - `provider`: provider processes, the run coordinator and the run slot
//! - `completion`: line state, candidate transformation and the dispatcher
//! - `config`: Configuration management
//! - `cli`: Command-line interface and argument parsing
//! - `repl`: Demo shell using the bridge as its completer
//! - `error`: Error types and handling
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use compbridge::completion::{CompletionOutcome, Dispatcher, Host, LineState, PopupBuffer};
//! use compbridge::config::CompletionConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = CompletionConfig { enable: true, ..CompletionConfig::default() };
//!     let popups = PopupBuffer::new();
//!     let host = Host::system(
//!         Arc::new(HashMap::<String, String>::new()),
//!         Arc::new(settings),
//!         Arc::new(popups.clone()),
//!     );
//!
//!     let dispatcher = Dispatcher::new("carapace", host);
//!     let result = dispatcher.complete(&LineState::parse("git chec", 8)).await;
//!     if let CompletionOutcome::Matches(matches) = result.outcome {
//!         for m in matches {
//!             println!("{}", m.text);
//!         }
//!     }
//! }
//! ```

pub mod cli;
pub mod codec;
pub mod completion;
pub mod config;
pub mod error;
pub mod provider;
pub mod repl;

// Re-export commonly used types
pub use completion::{CompletionMatch, CompletionOutcome, DispatchResult, Dispatcher, LineState};
pub use config::Config;
pub use error::{BridgeError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
