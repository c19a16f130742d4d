//! Creating, persisting and reloading archive directories.
//!
//! Layout of a finished run:
//!
//! ```text
//! <root>/info.json
//! <root>/attachments/<id>[.<ext>]
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::INFO_FILE;
use crate::error::ArchiveError;
use crate::model::ArchiveFile;
use crate::storage::FileSink;

/// Create the root and attachments directories and return an empty archive.
///
/// # Errors
///
/// Returns an error if either directory cannot be created.
pub async fn create_archive(fs: &dyn FileSink, root: PathBuf) -> Result<ArchiveFile, ArchiveError> {
    let archive = ArchiveFile::empty(root);
    fs.create_dir_all(&archive.path).await?;
    fs.create_dir_all(&archive.attachments_dir()).await?;
    Ok(archive)
}

/// Write the whole archive as pretty-printed JSON to `<root>/info.json`.
///
/// No atomic replace; a crash mid-write leaves a truncated file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn persist(fs: &dyn FileSink, archive: &ArchiveFile) -> Result<PathBuf, ArchiveError> {
    let json = serde_json::to_string_pretty(archive)?;
    let path = archive.path.join(INFO_FILE);
    fs.write(&path, json.as_bytes()).await?;

    info!(
        path = %path.display(),
        messages = archive.messages.len(),
        attachments = archive.attachments.len(),
        users = archive.users.len(),
        "Archive saved"
    );

    Ok(path)
}

/// Read a persisted archive back from its root directory.
///
/// # Errors
///
/// Returns an error if `info.json` is missing or malformed.
pub async fn load(root: &Path) -> Result<ArchiveFile, ArchiveError> {
    let path = root.join(INFO_FILE);
    let raw = tokio::fs::read(&path)
        .await
        .map_err(|source| ArchiveError::Load { path, source })?;
    Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArchiveAttachment, ArchiveMessage, ArchiveUser, AttachmentType};
    use crate::storage::LocalFs;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_create_archive_makes_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("archive-1");

        let archive = create_archive(&LocalFs, root.clone()).await.unwrap();

        assert!(root.join("attachments").is_dir());
        assert_eq!(archive.path, root);
        assert!(archive.messages.is_empty());
    }

    #[tokio::test]
    async fn test_create_archive_fails_under_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let result = create_archive(&LocalFs, blocker.join("archive")).await;
        assert!(matches!(result, Err(ArchiveError::Storage(_))));
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut archive = create_archive(&LocalFs, dir.path().join("run")).await.unwrap();

        archive.attachments.insert(
            "avatar1".to_string(),
            ArchiveAttachment {
                id: "avatar1".to_string(),
                original_name: String::new(),
                original_url: "https://cdn.example/a.webp".to_string(),
                new_path: Some("attachments/avatar1.webp".to_string()),
                mime: Some("image/webp".to_string()),
                kind: AttachmentType::Avatar,
            },
        );
        archive.users.insert(
            "10".to_string(),
            ArchiveUser {
                id: "10".to_string(),
                username: "alice".to_string(),
                discriminator: "0001".to_string(),
                profile_picture: "avatar1".to_string(),
            },
        );
        archive.messages.insert(
            "99".to_string(),
            ArchiveMessage {
                sender: "10".to_string(),
                content: "hello".to_string(),
                original_content: "hello".to_string(),
                attachments: vec![],
                sent: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
                edited: Some(Utc.timestamp_millis_opt(1_700_000_100_000).unwrap()),
            },
        );

        let written = persist(&LocalFs, &archive).await.unwrap();
        assert_eq!(written, archive.path.join("info.json"));

        let text = std::fs::read_to_string(&written).unwrap();
        assert!(text.contains("\n  \"messages\""), "output should be pretty-printed");

        let reloaded = load(&archive.path).await.unwrap();
        assert_eq!(reloaded, archive);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load(dir.path()).await;
        assert!(matches!(result, Err(ArchiveError::Load { .. })));
    }
}
