//! Transfer orchestrator: plans parts, fans them out to a bounded
//! worker pool, and drives the finalize-or-abort decision.
//!
//! State machine per transfer:
//! `PLANNING -> COPYING -> FINALIZING -> DONE`, or
//! `PLANNING -> COPYING -> ABORTING -> FAILED`.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::handle::{ObjectDest, ObjectSource};
use crate::planner::{Part, effective_concurrency, plan_parts};
use crate::progress::{ProgressCounter, ProgressObserver};
use crate::retry::RetryPolicy;
use crate::{DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE, StoreError, TransferError};

/// Immutable parameters for one transfer, passed by value.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest {
    /// Part-size ceiling in bytes.
    pub max_part_size: u64,
    /// Requested worker count; clamped to the number of parts.
    pub concurrency: usize,
    /// Per-part retry behavior.
    pub retry: RetryPolicy,
}

impl Default for TransferRequest {
    fn default() -> Self {
        Self {
            max_part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of copying one part. Produced by a worker, consumed by the
/// orchestrator when deciding the transfer outcome.
#[derive(Debug)]
pub struct PartOutcome {
    /// The planned part this outcome belongs to.
    pub part: Part,
    /// Attempts spent, including the successful one.
    pub attempts: u32,
    /// Bytes copied on success, the last error on retry exhaustion.
    pub result: Result<u64, StoreError>,
}

/// Summary of a completed transfer.
///
/// `source_deleted == false` with a `delete_error` means the move
/// itself succeeded but the source object was left in place; the
/// destination is already finalized at that point.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    /// Object size in bytes.
    pub size: u64,
    /// Number of parts the object was split into.
    pub parts: usize,
    /// Bytes copied (equals `size` on success).
    pub bytes_copied: u64,
    /// Wall-clock duration in seconds.
    pub elapsed_secs: f64,
    /// Whether the source object was removed after finalize.
    pub source_deleted: bool,
    /// Delete failure message, if any.
    pub delete_error: Option<String>,
}

/// Owns the whole lifecycle of a single transfer.
pub struct Transferor {
    request: TransferRequest,
}

impl Default for Transferor {
    fn default() -> Self {
        Self::new(TransferRequest::default())
    }
}

impl Transferor {
    /// Creates an orchestrator for the given request.
    pub fn new(request: TransferRequest) -> Self {
        Self { request }
    }

    /// Moves one object from `source` to `dest`.
    ///
    /// On success the destination has been finalized and the source
    /// deleted (a delete failure is reported as a warning in the
    /// returned [`TransferReport`], not as an error). On failure the
    /// destination has been aborted, the source is untouched, and
    /// the first triggering error is returned; in-flight sibling
    /// parts are drained, not cancelled, before the decision.
    pub async fn run(
        &self,
        source: Arc<dyn ObjectSource>,
        dest: Arc<dyn ObjectDest>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<TransferReport, TransferError> {
        let started = Instant::now();

        // PLANNING. The size is queried once and cached; a backend
        // mutating the object mid-transfer is undefined behavior.
        // The destination handle already exists here, so planning
        // failures still discard its session state.
        let size = match source.size().await {
            Ok(size) => size,
            Err(err) => {
                self.abort_destination(&*dest).await;
                return Err(TransferError::Source(err));
            }
        };
        let parts = match plan_parts(size, self.request.max_part_size) {
            Ok(parts) => parts,
            Err(err) => {
                self.abort_destination(&*dest).await;
                return Err(err.into());
            }
        };
        let num_parts = parts.len();
        let workers = effective_concurrency(self.request.concurrency, num_parts);

        info!(
            source = %source.describe(),
            dest = %dest.describe(),
            size,
            parts = num_parts,
            workers,
            "starting transfer"
        );

        let progress = Arc::new(ProgressCounter::new(size, observer));

        // COPYING. A zero-length object skips straight to FINALIZING
        // so empty objects are still created and the source deleted.
        if !parts.is_empty() {
            if let Err(err) = self
                .copy_parts(&source, &dest, parts, workers, &progress)
                .await
            {
                self.abort_destination(&*dest).await;
                return Err(err);
            }
        }

        // FINALIZING.
        info!(parts = num_parts, "all parts copied, finalizing destination");
        if let Err(err) = dest.finalize().await {
            error!(error = %err, dest = %dest.describe(), "finalize failed");
            self.abort_destination(&*dest).await;
            return Err(TransferError::Finalize(err));
        }

        // Source deletion happens strictly after finalize succeeds.
        // A delete failure leaves the source stranded but the move is
        // logically complete, so it surfaces as a warning, not an
        // error.
        let (source_deleted, delete_error) = match source.delete().await {
            Ok(()) => {
                debug!(source = %source.describe(), "source deleted");
                (true, None)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    source = %source.describe(),
                    "destination finalized but source delete failed; source object left in place"
                );
                (false, Some(err.to_string()))
            }
        };

        info!(
            bytes = progress.copied(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "transfer complete"
        );

        Ok(TransferReport {
            size,
            parts: num_parts,
            bytes_copied: progress.copied(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            source_deleted,
            delete_error,
        })
    }

    /// Runs the bounded worker pool over all parts and drains every
    /// outcome before returning. First failure wins: later failures
    /// are logged but do not replace the already-decided error.
    async fn copy_parts(
        &self,
        source: &Arc<dyn ObjectSource>,
        dest: &Arc<dyn ObjectDest>,
        parts: Vec<Part>,
        workers: usize,
        progress: &Arc<ProgressCounter>,
    ) -> Result<(), TransferError> {
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for part in parts {
            let source = Arc::clone(source);
            let dest = Arc::clone(dest);
            let progress = Arc::clone(progress);
            let semaphore = Arc::clone(&semaphore);
            let retry = self.request.retry;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    // The semaphore lives as long as the pool; a
                    // closed semaphore means the pool is torn down.
                    return PartOutcome {
                        part,
                        attempts: 0,
                        result: Err(StoreError::Transient("worker pool shut down".into())),
                    };
                };
                copy_part(&*source, &*dest, part, retry, &progress).await
            });
        }

        let mut first_failure: Option<TransferError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => match outcome.result {
                    Ok(bytes) => {
                        debug!(
                            part = outcome.part.number(),
                            bytes,
                            attempts = outcome.attempts,
                            "part copied"
                        );
                    }
                    Err(err) => {
                        if first_failure.is_none() {
                            error!(
                                part = outcome.part.number(),
                                attempts = outcome.attempts,
                                error = %err,
                                "part failed, transfer will abort"
                            );
                            first_failure = Some(TransferError::Part {
                                number: outcome.part.number(),
                                attempts: outcome.attempts,
                                source: err,
                            });
                        } else {
                            debug!(
                                part = outcome.part.number(),
                                error = %err,
                                "additional part failure after outcome already decided"
                            );
                        }
                    }
                },
                Err(join_err) => {
                    if first_failure.is_none() {
                        first_failure = Some(TransferError::Worker(join_err.to_string()));
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// ABORTING. Best-effort cleanup; failures are logged and never
    /// raised over the triggering error.
    async fn abort_destination(&self, dest: &dyn ObjectDest) {
        info!(dest = %dest.describe(), "aborting destination upload");
        if let Err(err) = dest.abort().await {
            warn!(error = %err, dest = %dest.describe(), "abort cleanup failed");
        }
    }
}

/// Copies one part with retry: read the range from the source, then
/// upload it under the part's 1-based number. The same part is
/// retried in place with linear backoff until the attempt cap.
async fn copy_part(
    source: &dyn ObjectSource,
    dest: &dyn ObjectDest,
    part: Part,
    retry: RetryPolicy,
    progress: &ProgressCounter,
) -> PartOutcome {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_copy_part(source, dest, part).await {
            Ok(bytes) => {
                progress.add(bytes);
                return PartOutcome {
                    part,
                    attempts: attempt,
                    result: Ok(bytes),
                };
            }
            Err(err) => {
                if attempt >= retry.max_attempts {
                    return PartOutcome {
                        part,
                        attempts: attempt,
                        result: Err(err),
                    };
                }
                let delay = retry.backoff_after(attempt);
                debug!(
                    part = part.number(),
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "part attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_copy_part(
    source: &dyn ObjectSource,
    dest: &dyn ObjectDest,
    part: Part,
) -> Result<u64, StoreError> {
    let data = source.read_range(part.offset, part.length).await?;
    let bytes = data.len() as u64;
    dest.upload_part(part.number(), data).await?;
    Ok(bytes)
}
