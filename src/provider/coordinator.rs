//! Provider process coordinator
//!
//! Runs one provider invocation to completion on the current task. Output is
//! drained one line at a time, waiting at most [`POLL_INTERVAL`] per attempt so
//! the idle clock and the cancellation token are checked regularly without
//! blocking the runtime.
//!
//! A run ends in one of three ways:
//! - end of output, which is success even after an external kill
//! - output still open [`KILL_DRAIN_LIMIT`] after an external kill, also success
//! - no output for longer than the invocation timeout ([`FailureReason::Timeout`])
//! - a launch or read failure ([`FailureReason::Terminated`])

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::invocation::ProviderInvocation;
use super::process::{ProcessLauncher, SystemLauncher};

/// Maximum wait for a single line before the idle clock is checked.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output is drained after an external kill. A killed provider's
/// own children can keep its stdout open indefinitely.
pub const KILL_DRAIN_LIMIT: Duration = Duration::from_millis(250);

/// Why a run did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The run succeeded
    None,
    /// The process could not be started or its output could not be read
    Terminated,
    /// No output arrived within the timeout
    Timeout,
}

/// Outcome of a single provider run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// True when output was drained to the end
    pub succeeded: bool,

    /// Every line read, each followed by `\n`
    pub output: String,

    /// Failure classification, `None` on success
    pub failure: FailureReason,
}

impl RunResult {
    fn success(output: String) -> Self {
        Self {
            succeeded: true,
            output,
            failure: FailureReason::None,
        }
    }

    fn failed(failure: FailureReason, output: String) -> Self {
        Self {
            succeeded: false,
            output,
            failure,
        }
    }
}

/// Drives provider processes started by a [`ProcessLauncher`].
#[derive(Clone)]
pub struct Coordinator {
    launcher: Arc<dyn ProcessLauncher>,
    poll_interval: Duration,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Arc::new(SystemLauncher))
    }
}

impl Coordinator {
    /// Create a coordinator using `launcher` to start processes.
    pub fn new(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Run `invocation` until end of output, timeout or failure.
    ///
    /// Cancelling `cancel` kills the process; draining then continues until
    /// the output closes, or for at most [`KILL_DRAIN_LIMIT`], and the run
    /// reports success with whatever was read.
    ///
    /// # Arguments
    /// * `invocation` - Command line and idle timeout
    /// * `cancel` - Token fired when the run is terminated from outside
    ///
    /// # Returns
    /// * `RunResult` - Collected output and failure classification
    pub async fn run(&self, invocation: &ProviderInvocation, cancel: CancellationToken) -> RunResult {
        debug!(command = %invocation.command_line(), timeout = ?invocation.timeout, "Starting provider");

        let mut process = match self.launcher.launch(invocation) {
            Ok(process) => process,
            Err(e) => {
                warn!(error = %e, "Provider failed to start");
                return RunResult::failed(FailureReason::Terminated, String::new());
            }
        };

        let mut output = String::new();
        let mut last_output = Instant::now();
        let mut killed_at: Option<Instant> = None;

        loop {
            if killed_at.is_some_and(|at| at.elapsed() > KILL_DRAIN_LIMIT) {
                debug!(bytes = output.len(), "Provider output still open after kill");
                return RunResult::success(output);
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled(), if killed_at.is_none() => {
                    debug!("Provider run cancelled, killing process");
                    killed_at = Some(Instant::now());
                    process.kill();
                }

                next = tokio::time::timeout(self.poll_interval, process.next_line()) => match next {
                    Ok(Ok(Some(line))) => {
                        trace!(line = %line, "Provider output");
                        output.push_str(&line);
                        output.push('\n');
                        last_output = Instant::now();
                    }
                    Ok(Ok(None)) => {
                        debug!(bytes = output.len(), "Provider output complete");
                        return RunResult::success(output);
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Provider output unreadable");
                        process.kill();
                        return RunResult::failed(FailureReason::Terminated, output);
                    }
                    Err(_) => {
                        if killed_at.is_none() && last_output.elapsed() > invocation.timeout {
                            warn!(timeout = ?invocation.timeout, "Provider idle timeout, killing process");
                            process.kill();
                            return RunResult::failed(FailureReason::Timeout, output);
                        }
                        tokio::task::yield_now().await;
                    }
                },
            }
        }
    }
}
