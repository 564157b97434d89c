//! Batch mode tracking through tokio task-local storage.
//!
//! Extractors check the flag to decide whether CPU-bound parsing should move to
//! `spawn_blocking`. Single-file extraction runs inline.

use std::cell::Cell;
use tokio::task_local;

task_local! {
    static BATCH_MODE: Cell<bool>;
}

/// `false` when the task-local is not set.
pub fn is_batch_mode() -> bool {
    BATCH_MODE.try_with(|cell| cell.get()).unwrap_or(false)
}

/// Run `future` with batch mode enabled.
pub async fn with_batch_mode<F, T>(future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    BATCH_MODE.scope(Cell::new(true), future).await
}
