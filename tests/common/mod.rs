//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use channel_archiver::platform::{
    AvatarFormat, ChannelMessage, ChannelUser, HistorySource, NativeAttachment, SourceError,
    UserDirectory,
};
use channel_archiver::storage::{FileSink, StorageError};
use chrono::{TimeZone, Utc};

/// In-memory channel history, stored newest first.
pub struct MockHistory {
    messages: Vec<ChannelMessage>,
    /// Cursor passed on every call, in order.
    pub calls: Mutex<Vec<Option<String>>>,
    /// 1-based call number that should fail.
    fail_on_call: Option<usize>,
}

impl MockHistory {
    pub fn new(messages: Vec<ChannelMessage>) -> Self {
        Self {
            messages,
            calls: Mutex::new(Vec::new()),
            fail_on_call: None,
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySource for MockHistory {
    async fn fetch_page(
        &self,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>, SourceError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(before.map(String::from));
            calls.len()
        };
        if self.fail_on_call == Some(call_number) {
            return Err(SourceError::Status {
                status: 503,
                body: "history unavailable".to_string(),
            });
        }

        let start = match before {
            None => 0,
            Some(cursor) => {
                let cursor: u64 = cursor.parse().unwrap();
                self.messages
                    .iter()
                    .position(|m| m.id.parse::<u64>().unwrap() < cursor)
                    .unwrap_or(self.messages.len())
            }
        };

        Ok(self.messages[start..].iter().take(limit).cloned().collect())
    }
}

/// Serves avatars from `<base>/avatars/<user-id>.<format>`.
pub struct StaticDirectory {
    pub base: String,
}

impl UserDirectory for StaticDirectory {
    fn avatar_url(&self, user: &ChannelUser, size: u32, format: AvatarFormat) -> String {
        format!(
            "{}/avatars/{}.{}?size={size}",
            self.base,
            user.id,
            format.as_str()
        )
    }
}

/// Accepts directories but refuses every file write.
pub struct ReadOnlyFs;

#[async_trait]
impl FileSink for ReadOnlyFs {
    async fn create_dir_all(&self, _path: &Path) -> Result<(), StorageError> {
        Ok(())
    }

    async fn write(&self, path: &Path, _bytes: &[u8]) -> Result<(), StorageError> {
        Err(StorageError {
            op: "write",
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

pub fn user(id: &str) -> ChannelUser {
    ChannelUser {
        id: id.to_string(),
        username: format!("user{id}"),
        discriminator: "0001".to_string(),
        avatar: Some(format!("hash{id}")),
    }
}

pub fn message(id: u64, author: &ChannelUser, content: &str) -> ChannelMessage {
    ChannelMessage {
        id: id.to_string(),
        author: author.clone(),
        content: content.to_string(),
        clean_content: content.to_string(),
        created_at: Utc.timestamp_millis_opt(1_600_000_000_000 + id as i64).unwrap(),
        edited_at: None,
        attachments: vec![],
        mentions: vec![],
    }
}

pub fn attachment(id: &str, url: &str) -> NativeAttachment {
    NativeAttachment {
        id: id.to_string(),
        filename: format!("{id}.bin"),
        proxy_url: url.to_string(),
    }
}

/// `count` messages by `author`, newest first, ids `count..=1`.
pub fn history(count: u64, author: &ChannelUser) -> Vec<ChannelMessage> {
    (1..=count).rev().map(|id| message(id, author, "hello")).collect()
}
