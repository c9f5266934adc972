//! Provider-backed completion.
//!
//! [`Dispatcher::complete`] is the single entry point hosts call per request.
//! It turns a [`LineState`] into a provider invocation, runs it, decodes the
//! output into a [`Payload`] and transforms that into [`CompletionMatch`]es.

pub mod dispatcher;
pub mod host;
pub mod line;
pub mod payload;
pub mod style;
pub mod transform;

pub use dispatcher::{
    CompletionOutcome, DEFAULT_EXCLUDE, DEFAULT_PROVIDER, DispatchResult, DispatchState,
    Dispatcher,
};
pub use host::{AliasTable, Host, Notifier, PathLookup, PopupBuffer, SettingsStore, SystemPaths};
pub use line::{LineState, Word};
pub use payload::{CandidateSpec, Payload};
pub use style::{NamedStyles, StyleResolver};
pub use transform::{CompletionKind, CompletionMatch, TransformContext, Transformed, transform};
