//! Local filesystem backend.
//!
//! `FsDest` stages parts as individual files inside a hidden staging
//! directory next to the destination, then materializes the final
//! object with a temp-file write and an atomic rename. Until
//! finalize succeeds, the destination path never shows a partial
//! object.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use blobmover_transfer::{ObjectDest, ObjectSource, StoreError, StoreFuture};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

/// Prefix for staged part files: `part-00001`, `part-00002`, ...
const PART_PREFIX: &str = "part-";

/// Source handle over a local file.
///
/// The size is read once at open and cached for the whole transfer.
/// Every `read_range` call opens its own file handle, so concurrent
/// range reads never share a cursor.
#[derive(Debug)]
pub struct FsSource {
    path: PathBuf,
    size: u64,
}

impl FsSource {
    /// Opens `path` and caches its size.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.display().to_string())
            } else {
                StoreError::Io(err)
            }
        })?;
        if !meta.is_file() {
            return Err(StoreError::InvalidPath(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        Ok(Self {
            size: meta.len(),
            path,
        })
    }
}

impl ObjectSource for FsSource {
    fn size(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move { Ok(self.size) })
    }

    fn read_range(&self, offset: u64, length: u64) -> StoreFuture<'_, Vec<u8>> {
        Box::pin(async move {
            let mut file = tokio::fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(offset)).await?;
            // Reading to end of a `take` clamps to the tail when the
            // range runs past the end of the file.
            let mut buf = Vec::with_capacity(length.min(self.size.saturating_sub(offset)) as usize);
            file.take(length).read_to_end(&mut buf).await?;
            Ok(buf)
        })
    }

    fn delete(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            tokio::fs::remove_file(&self.path).await.map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    StoreError::NotFound(self.path.display().to_string())
                } else {
                    StoreError::Io(err)
                }
            })
        })
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

/// Destination handle writing to a local file via staged parts.
#[derive(Debug)]
pub struct FsDest {
    final_path: PathBuf,
    parent: PathBuf,
    staging_dir: PathBuf,
}

impl FsDest {
    /// Opens a part-staging session for `path`.
    ///
    /// The destination's parent directory must already exist; the
    /// staging directory `.{name}.parts-{id}` is created inside it.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let final_path = path.as_ref().to_path_buf();
        let name = final_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StoreError::InvalidPath(format!(
                    "destination has no file name: {}",
                    final_path.display()
                ))
            })?
            .to_string();

        let parent = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !tokio::fs::try_exists(&parent).await? {
            return Err(StoreError::InvalidPath(format!(
                "destination directory does not exist: {}",
                parent.display()
            )));
        }

        let staging_dir = parent.join(format!(".{name}.parts-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::create_dir(&staging_dir).await?;
        debug!(staging = %staging_dir.display(), "opened staging session");

        Ok(Self {
            final_path,
            parent,
            staging_dir,
        })
    }

    fn part_path(&self, part_number: u64) -> PathBuf {
        self.staging_dir.join(format!("{PART_PREFIX}{part_number:05}"))
    }

    /// Lists staged part numbers in ascending order.
    async fn staged_parts(&self) -> Result<Vec<u64>, StoreError> {
        let mut numbers = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.staging_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(num) = name.strip_prefix(PART_PREFIX) {
                if let Ok(n) = num.parse::<u64>() {
                    numbers.push(n);
                }
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }
}

impl ObjectDest for FsDest {
    fn upload_part(&self, part_number: u64, data: Vec<u8>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            // A plain write overwrites, so a retried part replaces
            // its previous bytes instead of duplicating them.
            tokio::fs::write(self.part_path(part_number), &data).await?;
            Ok(())
        })
    }

    fn finalize(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let numbers = self.staged_parts().await?;
            for (i, number) in numbers.iter().enumerate() {
                let expected = i as u64 + 1;
                if *number != expected {
                    return Err(StoreError::IncompletePartSet { missing: expected });
                }
            }

            // Assemble into a temp file in the destination directory,
            // then rename over the final path. Zero staged parts
            // produce a valid empty object.
            let tmp_path = self
                .parent
                .join(format!(".{}.tmp-{}", object_name(&self.final_path), uuid::Uuid::new_v4().simple()));
            let mut out = tokio::fs::File::create(&tmp_path).await?;
            for number in &numbers {
                let mut part = tokio::fs::File::open(self.part_path(*number)).await?;
                tokio::io::copy(&mut part, &mut out).await?;
            }
            out.flush().await?;
            out.sync_all().await?;
            drop(out);

            tokio::fs::rename(&tmp_path, &self.final_path).await?;
            tokio::fs::remove_dir_all(&self.staging_dir).await?;
            debug!(
                dest = %self.final_path.display(),
                parts = numbers.len(),
                "destination finalized"
            );
            Ok(())
        })
    }

    fn abort(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            match tokio::fs::remove_dir_all(&self.staging_dir).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StoreError::Io(err)),
            }
        })
    }

    fn describe(&self) -> String {
        format!("file://{}", self.final_path.display())
    }
}

fn object_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("object")
}
