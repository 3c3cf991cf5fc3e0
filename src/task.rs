//! Deadline-bounded work on a dedicated thread.
//!
//! [`run_with_deadline`] spawns the work on its own named thread and waits for
//! its result with a timeout. Cancellation is soft: on expiry the thread is
//! abandoned, not killed, and may keep running to completion in the
//! background. Its result is discarded because the receiving end of its
//! channel is dropped when the caller returns, so nothing it produces can be
//! observed after abandonment.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

/// Why a deadline-bounded task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The work did not finish within the budget.
    #[error("task did not finish within {0:?}")]
    Timeout(Duration),

    /// The work panicked; carries the panic message.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// Runs `work` on a new thread named `name`, waiting at most `budget`.
pub fn run_with_deadline<T, F>(name: &str, budget: Duration, work: F) -> Result<T, TaskError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    // Capacity 1 so the worker's send never blocks, even once abandoned.
    let (tx, rx) = bounded(1);

    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(work));
            // Fails only when the caller already gave up; the value is dropped.
            let _ = tx.send(outcome);
        })
        .map_err(|e| TaskError::Spawn(e.to_string()))?;

    match rx.recv_timeout(budget) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(payload)) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        Err(RecvTimeoutError::Timeout) => Err(TaskError::Timeout(budget)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(TaskError::Panicked("worker exited without a result".to_string()))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
