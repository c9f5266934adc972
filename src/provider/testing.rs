//! Scripted provider processes for coordinator and dispatcher tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::invocation::ProviderInvocation;
use super::process::{ProcessLauncher, ProviderProcess};
use crate::error::{ProcessError, Result};

/// Behaviour of one scripted process.
#[derive(Debug, Clone, Default)]
pub struct Script {
    lines: Vec<(Duration, String)>,
    hang: bool,
    hold_output: bool,
    fail_start: bool,
    read_error: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `text` at `at_ms` milliseconds after launch.
    pub fn line(mut self, at_ms: u64, text: &str) -> Self {
        self.lines.push((Duration::from_millis(at_ms), text.to_string()));
        self
    }

    /// Emit the whole of `text` immediately, one line per line.
    pub fn output(mut self, text: &str) -> Self {
        for line in text.lines() {
            self.lines.push((Duration::ZERO, line.to_string()));
        }
        self
    }

    /// Never close output after the scripted lines.
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Keep output open after a kill, as an orphaned child holding stdout would.
    pub fn hold_output(mut self) -> Self {
        self.hold_output = true;
        self
    }

    pub fn fail_to_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Fail the read after the scripted lines.
    pub fn read_error(mut self) -> Self {
        self.read_error = true;
        self
    }
}

/// Counts scripted processes that are still alive.
#[derive(Debug, Clone, Default)]
pub struct LiveCounter {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl LiveCounter {
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn started(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn ended(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Launcher replaying scripts in order; the last script repeats.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    scripts: Mutex<VecDeque<Script>>,
    launches: Arc<Mutex<Vec<ProviderInvocation>>>,
    live: LiveCounter,
}

impl ScriptedLauncher {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }

    pub fn live_counter(&self) -> LiveCounter {
        self.live.clone()
    }

    /// Every invocation launched so far, shared with the launcher.
    pub fn launches(&self) -> Arc<Mutex<Vec<ProviderInvocation>>> {
        Arc::clone(&self.launches)
    }

    fn next_script(&self) -> Script {
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.len() > 1 {
            scripts.pop_front().unwrap_or_default()
        } else {
            scripts.front().cloned().unwrap_or_default()
        }
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(&self, invocation: &ProviderInvocation) -> Result<Box<dyn ProviderProcess>> {
        self.launches.lock().unwrap().push(invocation.clone());

        let script = self.next_script();
        if script.fail_start {
            return Err(ProcessError::StartFailed(invocation.executable.clone()).into());
        }

        self.live.started();
        Ok(Box::new(ScriptedProcess {
            started: Instant::now(),
            pending: script.lines.into(),
            hang: script.hang,
            hold_output: script.hold_output,
            read_error: script.read_error,
            killed: false,
            alive: true,
            live: self.live.clone(),
        }))
    }
}

struct ScriptedProcess {
    started: Instant,
    pending: VecDeque<(Duration, String)>,
    hang: bool,
    hold_output: bool,
    read_error: bool,
    killed: bool,
    alive: bool,
    live: LiveCounter,
}

impl ScriptedProcess {
    fn release(&mut self) {
        if self.alive {
            self.alive = false;
            self.live.ended();
        }
    }
}

#[async_trait]
impl ProviderProcess for ScriptedProcess {
    async fn next_line(&mut self) -> Result<Option<String>> {
        if self.killed && !self.hold_output {
            self.release();
            return Ok(None);
        }

        if let Some((at, _)) = self.pending.front() {
            tokio::time::sleep_until(self.started + *at).await;
            return Ok(self.pending.pop_front().map(|(_, line)| line));
        }

        if self.read_error {
            self.release();
            return Err(ProcessError::ReadFailed("scripted read error".to_string()).into());
        }

        if self.hang {
            std::future::pending::<()>().await;
        }

        self.release();
        Ok(None)
    }

    fn kill(&mut self) {
        self.killed = true;
        self.release();
    }
}

impl Drop for ScriptedProcess {
    fn drop(&mut self) {
        self.release();
    }
}
