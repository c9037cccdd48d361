//! End-to-end moves through the real engine and real backends.

use std::sync::Arc;

use blobmover_store::fs::{FsDest, FsSource};
use blobmover_store::mem::MemStore;
use blobmover_transfer::{NoOpObserver, RetryPolicy, TransferRequest, Transferor};

fn request(max_part_size: u64, concurrency: usize) -> TransferRequest {
    TransferRequest {
        max_part_size,
        concurrency,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: std::time::Duration::from_millis(1),
        },
    }
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 241) as u8).collect()
}

#[tokio::test]
async fn moves_file_between_directories() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("src.bin");
    let dst_path = dir.path().join("dst.bin");
    let data = payload(300 * 1024);
    std::fs::write(&src_path, &data).unwrap();

    let source = Arc::new(FsSource::open(&src_path).await.unwrap());
    let dest = Arc::new(FsDest::create(&dst_path).await.unwrap());

    let report = Transferor::new(request(64 * 1024, 4))
        .run(source, dest, Arc::new(NoOpObserver))
        .await
        .unwrap();

    assert_eq!(report.size, data.len() as u64);
    assert_eq!(report.parts, 5); // ceil(300/64)
    assert_eq!(report.bytes_copied, data.len() as u64);
    assert!(report.source_deleted);

    assert_eq!(std::fs::read(&dst_path).unwrap(), data);
    assert!(!src_path.exists(), "source removed after successful move");

    // No staging or temp litter left behind.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n != "dst.bin")
        .collect();
    assert!(leftovers.is_empty(), "unexpected leftovers: {leftovers:?}");
}

#[tokio::test]
async fn moves_zero_length_file() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("empty.bin");
    let dst_path = dir.path().join("out.bin");
    std::fs::write(&src_path, b"").unwrap();

    let source = Arc::new(FsSource::open(&src_path).await.unwrap());
    let dest = Arc::new(FsDest::create(&dst_path).await.unwrap());

    let report = Transferor::new(request(64 * 1024, 4))
        .run(source, dest, Arc::new(NoOpObserver))
        .await
        .unwrap();

    assert_eq!(report.parts, 0);
    assert_eq!(std::fs::read(&dst_path).unwrap(), b"");
    assert!(!src_path.exists());
}

#[tokio::test]
async fn mem_round_trip_across_concurrency_levels() {
    for concurrency in [1, 2, 5, 8] {
        let store = MemStore::new();
        let data = payload(10_000);
        store.put("src", data.clone());

        let source = Arc::new(store.source("src"));
        let dest = Arc::new(store.dest("dst"));

        // 617 does not divide 10_000, so the final part is short.
        let report = Transferor::new(request(617, concurrency))
            .run(source, dest, Arc::new(NoOpObserver))
            .await
            .unwrap();

        assert_eq!(report.bytes_copied, 10_000);
        assert_eq!(store.get("dst").unwrap(), data, "concurrency={concurrency}");
        assert!(!store.contains("src"));
    }
}

#[tokio::test]
async fn cross_backend_move_mem_to_fs() {
    let dir = tempfile::tempdir().unwrap();
    let dst_path = dir.path().join("out.bin");

    let store = MemStore::new();
    let data = payload(5000);
    store.put("src", data.clone());

    let source = Arc::new(store.source("src"));
    let dest = Arc::new(FsDest::create(&dst_path).await.unwrap());

    Transferor::new(request(1024, 3))
        .run(source, dest, Arc::new(NoOpObserver))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dst_path).unwrap(), data);
    assert!(!store.contains("src"));
}
