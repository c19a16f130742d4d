//! Contracts the archiver needs from the chat platform.
//!
//! The pipeline never talks to the platform directly; it reads history through
//! [`HistorySource`] and resolves avatars through [`UserDirectory`]. The
//! [`crate::discord`] module provides the REST-backed implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A user as seen on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUser {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    /// Avatar hash, `None` when the user has the default avatar.
    pub avatar: Option<String>,
}

/// A file uploaded with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAttachment {
    /// Platform-assigned attachment id.
    pub id: String,
    pub filename: String,
    /// Media-proxy URL the file is downloaded from.
    pub proxy_url: String,
}

/// One historical message.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: String,
    pub author: ChannelUser,
    /// Raw text, including mention markup.
    pub content: String,
    /// Display rendering with mentions resolved.
    pub clean_content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub attachments: Vec<NativeAttachment>,
    /// Users explicitly mentioned in the body.
    pub mentions: Vec<ChannelUser>,
}

/// Still-image formats the avatar CDN can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarFormat {
    Webp,
    Png,
}

impl AvatarFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("history request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("history request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode history page: {0}")]
    Decode(String),
    #[error("rate limited {attempts} times in a row")]
    RateLimited { attempts: u32 },
}

/// Paged access to a channel's history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch up to `limit` messages strictly older than `before`, newest first.
    /// With no cursor the page starts at the newest message in the channel.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal to the archive run.
    async fn fetch_page(
        &self,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>, SourceError>;
}

/// Resolves avatar URLs.
pub trait UserDirectory: Send + Sync {
    /// URL of `user`'s avatar at `size` pixels in `format`.
    fn avatar_url(&self, user: &ChannelUser, size: u32, format: AvatarFormat) -> String;
}
