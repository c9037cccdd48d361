//! In-memory backend.
//!
//! A [`MemStore`] is a shared map of named objects. Handles from the
//! same store see each other's writes, which makes it the harness of
//! choice for exercising the engine in tests and examples.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use blobmover_transfer::{ObjectDest, ObjectSource, StoreError, StoreFuture};

/// Shared in-memory object map. Cloning hands out another handle to
/// the same underlying storage.
#[derive(Clone, Default, Debug)]
pub struct MemStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an object.
    pub fn put(&self, name: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(name.to_string(), data);
    }

    /// Returns a copy of an object's bytes.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.lock().unwrap().contains_key(name)
    }

    /// Source handle for an existing object.
    pub fn source(&self, name: &str) -> MemSource {
        MemSource {
            store: self.clone(),
            name: name.to_string(),
        }
    }

    /// Destination handle accumulating parts for `name`.
    pub fn dest(&self, name: &str) -> MemDest {
        MemDest {
            store: self.clone(),
            name: name.to_string(),
            parts: Mutex::new(BTreeMap::new()),
            finalized: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        }
    }
}

/// Source handle over one object in a [`MemStore`].
#[derive(Debug)]
pub struct MemSource {
    store: MemStore,
    name: String,
}

impl ObjectSource for MemSource {
    fn size(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.store
                .get(&self.name)
                .map(|data| data.len() as u64)
                .ok_or_else(|| StoreError::NotFound(self.name.clone()))
        })
    }

    fn read_range(&self, offset: u64, length: u64) -> StoreFuture<'_, Vec<u8>> {
        Box::pin(async move {
            let data = self
                .store
                .get(&self.name)
                .ok_or_else(|| StoreError::NotFound(self.name.clone()))?;
            let start = offset.min(data.len() as u64) as usize;
            let end = (offset + length).min(data.len() as u64) as usize;
            Ok(data[start..end].to_vec())
        })
    }

    fn delete(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut objects = self.store.objects.lock().unwrap();
            objects
                .remove(&self.name)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(self.name.clone()))
        })
    }

    fn describe(&self) -> String {
        format!("mem://{}", self.name)
    }
}

/// Destination handle accumulating numbered parts for one object.
#[derive(Debug)]
pub struct MemDest {
    store: MemStore,
    name: String,
    parts: Mutex<BTreeMap<u64, Vec<u8>>>,
    finalized: AtomicBool,
    aborted: AtomicBool,
}

impl MemDest {
    /// Whether `finalize` succeeded on this handle.
    pub fn finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }

    /// Whether `abort` was called on this handle.
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl ObjectDest for MemDest {
    fn upload_part(&self, part_number: u64, data: Vec<u8>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            // Insert overwrites: a retried part number replaces its
            // previous bytes.
            self.parts.lock().unwrap().insert(part_number, data);
            Ok(())
        })
    }

    fn finalize(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let parts = self.parts.lock().unwrap();
            let mut assembled = Vec::new();
            for (i, (number, data)) in parts.iter().enumerate() {
                let expected = i as u64 + 1;
                if *number != expected {
                    return Err(StoreError::IncompletePartSet { missing: expected });
                }
                assembled.extend_from_slice(data);
            }
            self.store.put(&self.name, assembled);
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn abort(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.parts.lock().unwrap().clear();
            self.aborted.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("mem://{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn source_reads_and_deletes() {
        let store = MemStore::new();
        store.put("obj", b"0123456789".to_vec());

        let source = store.source("obj");
        assert_eq!(source.size().await.unwrap(), 10);
        assert_eq!(source.read_range(2, 3).await.unwrap(), b"234");
        assert_eq!(source.read_range(8, 10).await.unwrap(), b"89");

        source.delete().await.unwrap();
        assert!(!store.contains("obj"));
        assert!(matches!(
            source.size().await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn dest_assembles_by_part_number() {
        let store = MemStore::new();
        let dest = store.dest("obj");

        dest.upload_part(3, b"c".to_vec()).await.unwrap();
        dest.upload_part(1, b"a".to_vec()).await.unwrap();
        dest.upload_part(2, b"b".to_vec()).await.unwrap();
        dest.finalize().await.unwrap();

        assert_eq!(store.get("obj").unwrap(), b"abc");
        assert!(dest.finalized());
    }

    #[tokio::test]
    async fn dest_reupload_is_idempotent() {
        let store = MemStore::new();
        let dest = store.dest("obj");

        dest.upload_part(1, b"first".to_vec()).await.unwrap();
        dest.upload_part(2, b"!".to_vec()).await.unwrap();
        // Simulated retry of part 1.
        dest.upload_part(1, b"first".to_vec()).await.unwrap();
        dest.finalize().await.unwrap();

        assert_eq!(store.get("obj").unwrap(), b"first!");
    }

    #[tokio::test]
    async fn dest_gap_fails_finalize() {
        let store = MemStore::new();
        let dest = store.dest("obj");

        dest.upload_part(2, b"b".to_vec()).await.unwrap();
        let err = dest.finalize().await.unwrap_err();
        assert!(matches!(err, StoreError::IncompletePartSet { missing: 1 }));
        assert!(!store.contains("obj"));
    }

    #[tokio::test]
    async fn dest_zero_parts_finalizes_empty_object() {
        let store = MemStore::new();
        let dest = store.dest("obj");
        dest.finalize().await.unwrap();
        assert_eq!(store.get("obj").unwrap(), b"");
    }

    #[tokio::test]
    async fn dest_abort_discards_parts() {
        let store = MemStore::new();
        let dest = store.dest("obj");
        dest.upload_part(1, b"a".to_vec()).await.unwrap();
        dest.abort().await.unwrap();
        assert!(dest.aborted());
        assert!(!store.contains("obj"));
    }
}
