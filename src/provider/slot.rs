//! The process-wide provider run slot
//!
//! At most one provider run may be active at a time. The slot is Idle until a
//! run claims it and returns to Idle when the claiming [`RunGuard`] is dropped,
//! whichever way the run ended.
//!
//! [`RunSlot::terminate_active`] only asks the occupant to stop. The slot stays
//! held until the occupant's coordinator has killed its process and dropped
//! the guard, so no new process can start while the old one is alive.
//! Requests arriving in that window wait for the release with
//! [`RunSlot::claim_when_released`].

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::coordinator::POLL_INTERVAL;

/// Bookkeeping for the run currently holding the slot.
#[derive(Debug)]
struct ActiveRun {
    id: Uuid,
    executable: String,
    cancel: CancellationToken,
    started: Instant,
}

/// Shared handle to the single run slot.
#[derive(Debug, Clone, Default)]
pub struct RunSlot {
    inner: Arc<Mutex<Option<ActiveRun>>>,
}

/// Proof of slot ownership. Frees the slot on drop.
#[derive(Debug)]
pub struct RunGuard {
    slot: RunSlot,
    id: Uuid,
    cancel: CancellationToken,
}

static GLOBAL_SLOT: OnceLock<RunSlot> = OnceLock::new();

impl RunSlot {
    /// Create an independent, idle slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide slot, created on first use.
    pub fn global() -> Self {
        GLOBAL_SLOT.get_or_init(RunSlot::new).clone()
    }

    /// Whether a run currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }

    /// How long the current occupant has been running.
    pub fn active_for(&self) -> Option<Duration> {
        self.lock().as_ref().map(|run| run.started.elapsed())
    }

    /// Claim the slot for a run of `executable`.
    ///
    /// # Returns
    /// * `Option<RunGuard>` - Guard for the new run, or `None` if occupied
    pub fn claim(&self, executable: &str) -> Option<RunGuard> {
        let mut active = self.lock();
        if active.is_some() {
            return None;
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        *active = Some(ActiveRun {
            id,
            executable: executable.to_string(),
            cancel: cancel.clone(),
            started: Instant::now(),
        });
        debug!(run = %id, executable, "Run slot claimed");

        Some(RunGuard {
            slot: self.clone(),
            id,
            cancel,
        })
    }

    /// Whether the occupant has been terminated but not yet released.
    pub fn is_terminating(&self) -> bool {
        self.lock().as_ref().is_some_and(|run| run.cancel.is_cancelled())
    }

    /// Force-terminate the current occupant.
    ///
    /// Cancels the occupant's token. The slot is freed when the occupant's
    /// guard drops, after its process has been killed.
    ///
    /// # Returns
    /// * `bool` - True if a run was terminated
    pub fn terminate_active(&self) -> bool {
        match self.lock().as_ref() {
            Some(run) => {
                warn!(
                    run = %run.id,
                    executable = %run.executable,
                    elapsed_ms = run.started.elapsed().as_millis() as u64,
                    "Terminating stale provider run"
                );
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Claim the slot, waiting up to `grace` for the occupant to release it.
    ///
    /// # Returns
    /// * `Option<RunGuard>` - Guard for the new run, or `None` if still occupied
    pub async fn claim_when_released(&self, executable: &str, grace: Duration) -> Option<RunGuard> {
        let deadline = Instant::now() + grace;
        loop {
            if let Some(guard) = self.claim(executable) {
                return Some(guard);
            }
            if Instant::now() >= deadline {
                debug!(executable, "Run slot still occupied after grace period");
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RunGuard {
    /// Run identifier, unique per claim.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Token cancelled when this run is terminated from outside.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut active = self.slot.lock();
        // Only the occupant's own guard frees the slot.
        if active.as_ref().is_some_and(|run| run.id == self.id) {
            *active = None;
            debug!(run = %self.id, "Run slot released");
        }
    }
}
