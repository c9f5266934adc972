//! Completion request dispatcher
//!
//! Entry point for one completion request. A request moves through
//! [`DispatchState`]s:
//!
//! ```text
//! Idle -> Invoking -> Decoding -> Done
//!                  \-> TimedOut
//!                  \-> Busy
//! ```
//!
//! Cheap checks run first so no process is started for lines the provider
//! cannot serve: the feature must be enabled, there must be an argument to
//! complete, and the command must resolve, exist and not be excluded.

use std::time::Duration;

use tracing::{debug, warn};

use super::host::Host;
use super::line::{LineState, split_words};
use super::payload::Payload;
use super::transform::{CompletionMatch, TransformContext, transform};
use crate::error::ProcessError;
use crate::provider::{Coordinator, FailureReason, ProviderInvocation, RunGuard, RunSlot};

/// Timeout of the first provider attempt.
pub const FIRST_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a request waits for a terminated run to release the slot.
/// Longer than [`KILL_DRAIN_LIMIT`](crate::provider::KILL_DRAIN_LIMIT).
pub const STALE_RUN_GRACE: Duration = Duration::from_secs(1);

/// Retry timeout in seconds when the `timeout` setting is absent or invalid.
pub const DEFAULT_RETRY_TIMEOUT_SECS: f64 = 5.0;

/// Commands never sent to the provider unless configured otherwise.
pub const DEFAULT_EXCLUDE: &str = "cd;chdir;pushd;popd;set";

/// Provider executable used unless configured otherwise.
pub const DEFAULT_PROVIDER: &str = "carapace";

/// Alias expansions must end with this wildcard to be completable.
const ALIAS_WILDCARD: &str = "$*";

/// Trimmed output shorter than this cannot hold a provider document.
const MIN_OUTPUT_LEN: usize = 3;

/// Setting names read from the [`SettingsStore`](super::host::SettingsStore).
pub mod settings {
    pub const ENABLE: &str = "enable";
    pub const EXCLUDE: &str = "exclude";
    pub const TIMEOUT: &str = "timeout";
}

/// Request states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Invoking,
    Decoding,
    Done,
    TimedOut,
    Busy,
}

/// What the host should do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Nothing from the provider; other completion sources may run
    NoMatches,
    /// Matches to merge into the completion list
    Matches(Vec<CompletionMatch>),
    /// A message was already shown through the notifier
    Handled,
}

/// Final state and outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub state: DispatchState,
    pub outcome: CompletionOutcome,
}

impl DispatchResult {
    fn new(state: DispatchState, outcome: CompletionOutcome) -> Self {
        debug!(state = ?state, "Completion request finished");
        Self { state, outcome }
    }

    fn no_matches() -> Self {
        Self::new(DispatchState::Done, CompletionOutcome::NoMatches)
    }
}

/// Serves completion requests through an external provider.
pub struct Dispatcher {
    provider: String,
    host: Host,
    coordinator: Coordinator,
    slot: RunSlot,
    first_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher using the real process launcher and the
    /// process-wide run slot.
    ///
    /// # Arguments
    /// * `provider` - Provider executable name
    /// * `host` - Host collaborators
    pub fn new(provider: impl Into<String>, host: Host) -> Self {
        Self {
            provider: provider.into(),
            host,
            coordinator: Coordinator::default(),
            slot: RunSlot::global(),
            first_timeout: FIRST_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_coordinator(mut self, coordinator: Coordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn with_slot(mut self, slot: RunSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_first_timeout(mut self, timeout: Duration) -> Self {
        self.first_timeout = timeout;
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The run slot this dispatcher claims.
    pub fn slot(&self) -> &RunSlot {
        &self.slot
    }

    /// Generate completions for `line`.
    ///
    /// Never fails: every error ends in [`CompletionOutcome::NoMatches`] or,
    /// for busy and timed-out providers, a popup and
    /// [`CompletionOutcome::Handled`].
    pub async fn complete(&self, line: &LineState) -> DispatchResult {
        let Some(invocation) = self.prepare(line) else {
            return DispatchResult::no_matches();
        };

        debug!(state = ?DispatchState::Invoking, command = %invocation.command_line(), "Invoking provider");
        let Some(guard) = self.claim_slot().await else {
            self.slot.terminate_active();
            let message = ProcessError::Busy.to_string();
            warn!("{}", message);
            self.host.notifier.popup(&message);
            return DispatchResult::new(DispatchState::Busy, CompletionOutcome::Handled);
        };

        let cancel = guard.cancel_token();
        let mut result = self.coordinator.run(&invocation, cancel.clone()).await;
        if result.failure == FailureReason::Timeout && !cancel.is_cancelled() {
            let retry = invocation.with_timeout(self.retry_timeout());
            debug!(timeout = ?retry.timeout, "Retrying provider after timeout");
            result = self.coordinator.run(&retry, cancel).await;

            if result.failure == FailureReason::Timeout {
                let message = ProcessError::Timeout(retry.timeout).to_string();
                warn!("{}", message);
                self.host.notifier.popup(&message);
                return DispatchResult::new(DispatchState::TimedOut, CompletionOutcome::Handled);
            }
        }
        drop(guard);

        if !result.succeeded {
            debug!(failure = ?result.failure, "Provider run failed");
            return DispatchResult::no_matches();
        }

        self.decode(line, &result.output)
    }

    /// Claim the run slot. A run that is already being terminated is waited
    /// for; a live one is not.
    async fn claim_slot(&self) -> Option<RunGuard> {
        if let Some(guard) = self.slot.claim(&self.provider) {
            return Some(guard);
        }
        if !self.slot.is_terminating() {
            return None;
        }

        debug!("Waiting for terminated provider run to exit");
        self.slot
            .claim_when_released(&self.provider, STALE_RUN_GRACE)
            .await
    }

    fn prepare(&self, line: &LineState) -> Option<ProviderInvocation> {
        if !self.host.settings.get_bool(settings::ENABLE).unwrap_or(false) {
            debug!("Provider completion disabled");
            return None;
        }

        if !line.has_completable_argument() {
            return None;
        }

        let first = line.command_word()?;
        let Some((command, fixed_args)) = self.resolve_command(&first.text) else {
            debug!(word = %first.text, "Unsupported alias");
            return None;
        };

        let paths = &self.host.paths;
        if paths.find_executable(&command).is_none() {
            debug!(command = %command, "Command not found");
            return None;
        }
        if paths.find_executable(&self.provider).is_none() {
            debug!(provider = %self.provider, "Provider not found");
            return None;
        }

        if self.is_excluded(&command) {
            debug!(command = %command, "Command excluded");
            return None;
        }

        let mut args = vec![command, "export".to_string(), ".".to_string()];
        args.extend(fixed_args);
        args.extend(line.arguments().iter().map(|word| word.text.clone()));
        if line.trailing_space() {
            args.push(String::new());
        }

        Some(ProviderInvocation::new(
            self.provider.clone(),
            args,
            self.first_timeout,
        ))
    }

    /// Command and fixed arguments for the first word of the line.
    fn resolve_command(&self, word: &str) -> Option<(String, Vec<String>)> {
        match self.host.aliases.lookup(word) {
            Some(expansion) => parse_alias(&expansion),
            None => Some((word.to_string(), Vec::new())),
        }
    }

    fn is_excluded(&self, command: &str) -> bool {
        let exclude = self
            .host
            .settings
            .get_string(settings::EXCLUDE)
            .unwrap_or_else(|| DEFAULT_EXCLUDE.to_string());
        let stem = command_stem(command);

        exclude
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .any(|name| name.eq_ignore_ascii_case(stem))
    }

    fn retry_timeout(&self) -> Duration {
        let secs = self
            .host
            .settings
            .get_number(settings::TIMEOUT)
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .unwrap_or(DEFAULT_RETRY_TIMEOUT_SECS);
        Duration::from_secs_f64(secs)
    }

    fn decode(&self, line: &LineState, output: &str) -> DispatchResult {
        debug!(state = ?DispatchState::Decoding, bytes = output.len(), "Decoding provider output");

        let text = output.trim();
        if text.chars().count() < MIN_OUTPUT_LEN {
            debug!("Provider output too short");
            return DispatchResult::no_matches();
        }

        let payload = match Payload::decode(text) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("Provider output is not an object");
                return DispatchResult::no_matches();
            }
            Err(e) => {
                debug!(error = %e, "Provider output malformed");
                return DispatchResult::no_matches();
            }
        };

        let ctx = TransformContext {
            split_equals: line.completing_option_value(),
            styles: self.host.styles.as_ref(),
            paths: self.host.paths.as_ref(),
        };
        let transformed = transform(payload, &ctx);

        if let Some(message) = transformed.diagnostic {
            self.host.notifier.popup(&message);
            return DispatchResult::new(DispatchState::Done, CompletionOutcome::Handled);
        }

        if transformed.matches.is_empty() {
            DispatchResult::no_matches()
        } else {
            DispatchResult::new(
                DispatchState::Done,
                CompletionOutcome::Matches(transformed.matches),
            )
        }
    }
}

/// Split an alias expansion of the form `command [args..] $*`.
fn parse_alias(expansion: &str) -> Option<(String, Vec<String>)> {
    let body = expansion.trim_end().strip_suffix(ALIAS_WILDCARD)?;
    if !body.is_empty() && !body.ends_with(char::is_whitespace) {
        return None;
    }

    let mut words = split_words(body).into_iter();
    let command = words.next()?;
    Some((command, words.collect()))
}

/// File name of `command` without directory or extension.
fn command_stem(command: &str) -> &str {
    let name = command.rsplit(['/', '\\']).next().unwrap_or(command);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
