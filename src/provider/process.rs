//! Process-execution primitive
//!
//! The coordinator only needs two things from a running provider: the next
//! line of standard output, and a way to kill it. [`ProcessLauncher`] hides how
//! the process is started so the coordinator can be driven by scripted
//! processes in tests.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use super::invocation::ProviderInvocation;
use crate::error::{ProcessError, Result};

/// A started provider process.
#[async_trait]
pub trait ProviderProcess: Send {
    /// Next line of standard output, or `None` at end of output.
    ///
    /// Must be cancel-safe: dropping the future before it completes must not
    /// lose a line.
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Forcefully terminate the process. Output ends shortly afterwards.
    fn kill(&mut self);
}

/// Starts provider processes.
pub trait ProcessLauncher: Send + Sync {
    /// Start `invocation` with stdin closed, stdout piped and stderr discarded.
    fn launch(&self, invocation: &ProviderInvocation) -> Result<Box<dyn ProviderProcess>>;
}

/// Launcher backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

struct SystemProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, invocation: &ProviderInvocation) -> Result<Box<dyn ProviderProcess>> {
        let mut child = Command::new(&invocation.executable)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProcessError::StartFailed(format!("{}: {}", invocation.executable, e)))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ProcessError::StartFailed(format!("{}: stdout not captured", invocation.executable))
        })?;

        debug!(pid = ?child.id(), "Provider process started");

        Ok(Box::new(SystemProcess {
            child,
            lines: BufReader::new(stdout).lines(),
        }))
    }
}

#[async_trait]
impl ProviderProcess for SystemProcess {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines
            .next_line()
            .await
            .map_err(|e| ProcessError::ReadFailed(e.to_string()).into())
    }

    fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            // Already exited.
            debug!(error = %e, "Provider kill skipped");
        }
    }
}
