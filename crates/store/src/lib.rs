//! Storage backends for blobmover.
//!
//! Implements the [`ObjectSource`]/[`ObjectDest`] capability
//! contracts for the local filesystem (real transfers) and an
//! in-memory store (tests, examples). Cloud-provider adapters plug
//! in through the same traits and live outside this repository.

pub mod fs;
pub mod mem;

use std::sync::Arc;

use blobmover_locator::Locator;
use blobmover_transfer::{ObjectDest, ObjectSource, StoreError};

/// Builds a source handle for a locator.
///
/// Only `file` locators resolve here; cloud schemes report
/// [`StoreError::Unsupported`] until an adapter for that provider is
/// registered by the embedding application.
pub async fn open_source(locator: &Locator) -> Result<Arc<dyn ObjectSource>, StoreError> {
    match locator {
        Locator::File { path } => Ok(Arc::new(fs::FsSource::open(path).await?)),
        other => Err(StoreError::Unsupported(other.scheme().to_string())),
    }
}

/// Builds a destination handle for a locator. See [`open_source`]
/// for scheme coverage.
pub async fn open_dest(locator: &Locator) -> Result<Arc<dyn ObjectDest>, StoreError> {
    match locator {
        Locator::File { path } => Ok(Arc::new(fs::FsDest::create(path).await?)),
        other => Err(StoreError::Unsupported(other.scheme().to_string())),
    }
}
