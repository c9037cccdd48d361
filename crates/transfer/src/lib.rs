//! Chunked parallel transfer engine.
//!
//! Moves one large object between storage backends by partitioning it
//! into fixed-size parts, copying the parts through a bounded worker
//! pool with per-part retry, and committing the result with a
//! finalize-or-abort decision so the move appears atomic to external
//! observers.

mod handle;
mod orchestrator;
mod planner;
mod progress;
mod retry;

pub use handle::{ObjectDest, ObjectSource, StoreFuture};
pub use orchestrator::{PartOutcome, TransferReport, TransferRequest, Transferor};
pub use planner::{Part, PlanError, effective_concurrency, plan_parts};
pub use progress::{NoOpObserver, ProgressCounter, ProgressObserver};
pub use retry::RetryPolicy;

/// Default part-size ceiling: 64 MiB.
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Default worker count for a transfer.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Errors raised by source and destination handles.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("transient I/O error: {0}")]
    Transient(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("part {missing} missing from uploaded part set")]
    IncompletePartSet { missing: u64 },

    #[error("no backend registered for scheme: {0}")]
    Unsupported(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Errors surfaced by a transfer. Exactly one of these reaches the
/// caller per failed transfer; cleanup errors during abort and
/// post-finalize source deletion are logged instead.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("source error: {0}")]
    Source(StoreError),

    #[error("part {number} failed after {attempts} attempts: {source}")]
    Part {
        number: u64,
        attempts: u32,
        source: StoreError,
    },

    #[error("finalize failed: {0}")]
    Finalize(StoreError),

    #[error("worker task failed: {0}")]
    Worker(String),
}
