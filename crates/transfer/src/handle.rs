//! Source and destination capability contracts.
//!
//! Each storage backend implements these traits independently; the
//! engine drives them through trait objects and never sees provider
//! wire formats. Methods return boxed futures so the traits stay
//! object-safe and mockable.

use std::future::Future;
use std::pin::Pin;

use crate::StoreError;

/// Boxed future returned by handle operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Read access to one source object, plus the authority to delete it.
///
/// A handle is constructed once per transfer. Disjoint-range reads
/// are issued concurrently from multiple workers against the same
/// handle, so implementations must not keep a shared read cursor.
pub trait ObjectSource: Send + Sync + std::fmt::Debug {
    /// Size of the object in bytes.
    ///
    /// Queried once per transfer and cached by the orchestrator. If
    /// the backend mutates the object while a transfer is running,
    /// behavior is undefined.
    fn size(&self) -> StoreFuture<'_, u64>;

    /// Reads `length` bytes starting at `offset`. If `offset + length`
    /// exceeds the object size, returns the tail from `offset`.
    fn read_range(&self, offset: u64, length: u64) -> StoreFuture<'_, Vec<u8>>;

    /// Deletes the source object.
    fn delete(&self) -> StoreFuture<'_, ()>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Part accumulation for one destination object.
///
/// `upload_part` is called concurrently from multiple workers; the
/// handle records `(part_number, data)` pairs internally. `finalize`
/// and `abort` are mutually exclusive and each handle receives at
/// most one terminal call, made by the orchestrator after all
/// workers have joined.
pub trait ObjectDest: Send + Sync + std::fmt::Debug {
    /// Stores one part under a 1-based part number. Re-uploading an
    /// already-used number overwrites the previous data, so a
    /// retried part never duplicates bytes in the final object.
    fn upload_part(&self, part_number: u64, data: Vec<u8>) -> StoreFuture<'_, ()>;

    /// Assembles all uploaded parts into one object in ascending
    /// part-number order. Zero uploaded parts produce a valid empty
    /// object. A gap in the `1..=n` range fails with
    /// [`StoreError::IncompletePartSet`].
    fn finalize(&self) -> StoreFuture<'_, ()>;

    /// Best-effort discard of every uploaded part and any
    /// server-side session state. Runs during already-failing
    /// cleanup; the orchestrator logs its errors and never raises
    /// them over the triggering failure.
    fn abort(&self) -> StoreFuture<'_, ()>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}
