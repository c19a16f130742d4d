//! The in-memory archive snapshot, serialized verbatim to `info.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an attachment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttachmentType {
    /// A link found in message text.
    Url,
    /// A file uploaded with the message.
    File,
    /// A user's profile picture.
    Avatar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveUser {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    /// Attachment id of the downloaded avatar.
    pub profile_picture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveAttachment {
    pub id: String,
    pub original_name: String,
    pub original_url: String,
    /// Path relative to the archive root, `None` if the download failed.
    pub new_path: Option<String>,
    pub mime: Option<String>,
    #[serde(rename = "type")]
    pub kind: AttachmentType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMessage {
    /// User id of the author.
    pub sender: String,
    pub content: String,
    pub original_content: String,
    /// Ids of native attachments then embedded URLs, in capture order.
    pub attachments: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub sent: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub edited: Option<DateTime<Utc>>,
}

/// Everything captured during one archive run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveFile {
    pub messages: BTreeMap<String, ArchiveMessage>,
    pub attachments: BTreeMap<String, ArchiveAttachment>,
    pub users: BTreeMap<String, ArchiveUser>,
    /// Root directory of the run.
    pub path: PathBuf,
}

impl ArchiveFile {
    /// An empty archive rooted at `path`. Does not touch the filesystem.
    #[must_use]
    pub fn empty(path: PathBuf) -> Self {
        Self {
            messages: BTreeMap::new(),
            attachments: BTreeMap::new(),
            users: BTreeMap::new(),
            path,
        }
    }

    /// Directory downloaded files are written to.
    #[must_use]
    pub fn attachments_dir(&self) -> PathBuf {
        self.path.join(crate::constants::ATTACHMENTS_DIR)
    }
}
