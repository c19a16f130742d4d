use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to {op} {}: {source}", .path.display())]
pub struct StorageError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Where archive files are written.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Create `path` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError>;

    /// Write `bytes` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSink for LocalFs {
    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| StorageError {
                op: "create directory",
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        debug!(path = %path.display(), size = bytes.len(), "Writing file");
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| StorageError {
                op: "write",
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_fs_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        LocalFs.create_dir_all(&nested).await.unwrap();
        LocalFs.write(&nested.join("f.bin"), b"hello").await.unwrap();

        assert_eq!(std::fs::read(nested.join("f.bin")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = LocalFs
            .write(&dir.path().join("missing").join("f.bin"), b"x")
            .await
            .unwrap_err();
        assert_eq!(err.op, "write");
    }
}
