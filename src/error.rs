use std::path::PathBuf;

use thiserror::Error;

use crate::fetcher::FetchError;
use crate::platform::SourceError;
use crate::storage::StorageError;

/// Anything that aborts an archive run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to fetch channel history: {0}")]
    History(#[from] SourceError),
    #[error("failed to download avatar for user {user_id}: {source}")]
    Avatar {
        user_id: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to download attachment {attachment_id}: {source}")]
    Attachment {
        attachment_id: String,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to serialize archive: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to read archive at {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to package archive {}: {message}", .path.display())]
    Package { path: PathBuf, message: String },
}
