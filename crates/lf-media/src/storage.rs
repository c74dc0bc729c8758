//! Segment and part payload storage.
//!
//! A [`Storage`] is a cheap handle to the bytes of one segment or part. It is
//! either a reference-counted in-memory buffer or a spool file created with
//! [`tempfile`], which is unlinked once the last handle goes away. Readers
//! opened before a release keep working until they are dropped.

use bytes::Bytes;
use std::io::{Cursor, Write};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncRead;

use lf_core::{Result, StorageKind};

/// Boxed async reader over a payload.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send>>;

/// Handle to a segment or part payload.
#[derive(Debug, Clone)]
pub enum Storage {
    /// Payload held in RAM.
    Memory(Bytes),
    /// Payload spooled to a temporary file.
    Disk(Arc<SpoolFile>),
}

/// A temporary file holding one payload. Deleted on drop.
#[derive(Debug)]
pub struct SpoolFile {
    file: NamedTempFile,
    size: u64,
}

impl SpoolFile {
    /// Path of the spool file on disk.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Storage {
    /// Wrap an in-memory buffer.
    pub fn memory(data: impl Into<Bytes>) -> Self {
        Storage::Memory(data.into())
    }

    /// Write `data` to a new spool file in `dir` (or the system temp dir).
    ///
    /// This performs blocking I/O; async callers should run it on the
    /// blocking pool.
    pub fn spool(dir: Option<&Path>, data: &[u8]) -> Result<Self> {
        let mut file = match dir {
            Some(dir) => tempfile::Builder::new().prefix("lf-").tempfile_in(dir)?,
            None => tempfile::Builder::new().prefix("lf-").tempfile()?,
        };
        file.write_all(data)?;
        file.flush()?;

        tracing::trace!(path = %file.path().display(), size = data.len(), "spooled payload");

        Ok(Storage::Disk(Arc::new(SpoolFile {
            file,
            size: data.len() as u64,
        })))
    }

    /// Store `data` using the given backend.
    pub fn store(kind: StorageKind, dir: Option<&Path>, data: Bytes) -> Result<Self> {
        match kind {
            StorageKind::Memory => Ok(Self::memory(data)),
            StorageKind::Disk => Self::spool(dir, &data),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Storage::Memory(bytes) => bytes.len() as u64,
            Storage::Disk(spool) => spool.size,
        }
    }

    /// Open a fresh reader positioned at the start of the payload.
    pub async fn reader(&self) -> Result<ByteReader> {
        match self {
            Storage::Memory(bytes) => Ok(Box::pin(Cursor::new(bytes.clone()))),
            Storage::Disk(spool) => {
                let file = tokio::fs::File::open(spool.path()).await?;
                Ok(Box::pin(file))
            }
        }
    }

    /// Give up this handle. The underlying buffer or spool file is freed once
    /// no reader still holds it.
    pub fn release(self) {
        if let Storage::Disk(spool) = &self {
            tracing::trace!(
                path = %spool.path().display(),
                in_use = Arc::strong_count(spool) > 1,
                "releasing spool file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn read_all(storage: &Storage) -> Vec<u8> {
        let mut reader = storage.reader().await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn memory_reader_returns_payload() {
        let storage = Storage::memory(Bytes::from_static(b"hello"));
        assert_eq!(storage.size(), 5);
        assert_eq!(read_all(&storage).await, b"hello");
        // Readers are independent.
        assert_eq!(read_all(&storage).await, b"hello");
    }

    #[tokio::test]
    async fn disk_reader_returns_payload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::spool(Some(dir.path()), b"segment bytes").unwrap();
        assert_eq!(storage.size(), 13);
        assert_eq!(read_all(&storage).await, b"segment bytes");
    }

    #[test]
    fn release_deletes_spool_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::spool(Some(dir.path()), b"abc").unwrap();
        let path = match &storage {
            Storage::Disk(spool) => spool.path().to_path_buf(),
            Storage::Memory(_) => panic!("expected disk storage"),
        };
        assert!(path.exists());

        storage.release();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn open_handle_outlives_release() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::spool(Some(dir.path()), b"still here").unwrap();
        let in_flight = storage.clone();

        storage.release();
        assert_eq!(read_all(&in_flight).await, b"still here");
    }

    #[test]
    fn store_picks_backend() {
        let mem = Storage::store(StorageKind::Memory, None, Bytes::from_static(b"x")).unwrap();
        assert!(matches!(mem, Storage::Memory(_)));

        let dir = tempfile::tempdir().unwrap();
        let disk =
            Storage::store(StorageKind::Disk, Some(dir.path()), Bytes::from_static(b"x")).unwrap();
        assert!(matches!(disk, Storage::Disk(_)));
    }
}
