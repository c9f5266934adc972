//! External completion provider processes.
//!
//! - [`invocation`]: the command line for one request
//! - [`process`]: starting processes and reading their output
//! - [`coordinator`]: draining a run under a timeout and cancellation
//! - [`slot`]: the single process-wide run slot

pub mod coordinator;
pub mod invocation;
pub mod process;
pub mod slot;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, FailureReason, KILL_DRAIN_LIMIT, POLL_INTERVAL, RunResult};
pub use invocation::ProviderInvocation;
pub use process::{ProcessLauncher, ProviderProcess, SystemLauncher};
pub use slot::{RunGuard, RunSlot};
