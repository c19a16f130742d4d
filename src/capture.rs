//! Turning platform messages into archive records.
//!
//! An [`Archiver`] bundles the collaborators one run needs. Every method takes
//! the [`ArchiveFile`] by `&mut`, so a run has exactly one writer.

use tracing::{debug, warn};

use crate::constants::{ATTACHMENTS_DIR, AVATAR_MIME, AVATAR_SIZE, UNKNOWN_MIME};
use crate::error::ArchiveError;
use crate::fetcher::Fetcher;
use crate::links::{extract_urls, original_name};
use crate::model::{ArchiveAttachment, ArchiveFile, ArchiveMessage, ArchiveUser, AttachmentType};
use crate::naming::{generate_id, with_extension};
use crate::platform::{AvatarFormat, ChannelMessage, ChannelUser, UserDirectory};
use crate::storage::FileSink;

/// Session state for one archive run.
#[derive(Clone, Copy)]
pub struct Archiver<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub directory: &'a dyn UserDirectory,
    pub fs: &'a dyn FileSink,
}

impl<'a> Archiver<'a> {
    #[must_use]
    pub fn new(
        fetcher: &'a dyn Fetcher,
        directory: &'a dyn UserDirectory,
        fs: &'a dyn FileSink,
    ) -> Self {
        Self {
            fetcher,
            directory,
            fs,
        }
    }

    /// Ensure `user` has a record and a downloaded avatar.
    ///
    /// Users already in the archive are left untouched, so the first snapshot
    /// of a username or avatar wins.
    ///
    /// # Errors
    ///
    /// A failed avatar download or write aborts the run.
    pub async fn capture_user(
        &self,
        user: &ChannelUser,
        archive: &mut ArchiveFile,
    ) -> Result<(), ArchiveError> {
        if archive.users.contains_key(&user.id) {
            return Ok(());
        }

        let url = self
            .directory
            .avatar_url(user, AVATAR_SIZE, AvatarFormat::Webp);
        let fetched = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| ArchiveError::Avatar {
                user_id: user.id.clone(),
                source,
            })?;

        let id = generate_id();
        let relative = format!("{ATTACHMENTS_DIR}/{id}.webp");
        self.fs
            .write(&archive.path.join(&relative), &fetched.bytes)
            .await?;

        debug!(user_id = %user.id, username = %user.username, "Captured user");

        archive.attachments.insert(
            id.clone(),
            ArchiveAttachment {
                id: id.clone(),
                original_name: String::new(),
                original_url: url,
                new_path: Some(relative),
                mime: Some(AVATAR_MIME.to_string()),
                kind: AttachmentType::Avatar,
            },
        );
        archive.users.insert(
            user.id.clone(),
            ArchiveUser {
                id: user.id.clone(),
                username: user.username.clone(),
                discriminator: user.discriminator.clone(),
                profile_picture: id,
            },
        );

        Ok(())
    }

    /// Capture everything a message references and return the attachment ids
    /// that belong on the message: native files first, then embedded URLs.
    /// Mentioned users are captured too but contribute no ids.
    ///
    /// # Errors
    ///
    /// Native attachment and avatar failures propagate. Embedded URL failures
    /// are recorded as metadata-only attachments instead.
    pub async fn capture_attachments(
        &self,
        message: &ChannelMessage,
        archive: &mut ArchiveFile,
    ) -> Result<Vec<String>, ArchiveError> {
        for mentioned in &message.mentions {
            self.capture_user(mentioned, archive).await?;
        }

        let mut ids = Vec::with_capacity(message.attachments.len());

        for attachment in &message.attachments {
            let fetched = self
                .fetcher
                .fetch(&attachment.proxy_url)
                .await
                .map_err(|source| ArchiveError::Attachment {
                    attachment_id: attachment.id.clone(),
                    source,
                })?;

            let file_name = with_extension(&generate_id(), fetched.content_type.as_deref());
            let relative = format!("{ATTACHMENTS_DIR}/{file_name}");
            self.fs
                .write(&archive.path.join(&relative), &fetched.bytes)
                .await?;

            ids.push(attachment.id.clone());
            archive.attachments.insert(
                attachment.id.clone(),
                ArchiveAttachment {
                    id: attachment.id.clone(),
                    original_name: attachment.filename.clone(),
                    original_url: attachment.proxy_url.clone(),
                    new_path: Some(relative),
                    mime: fetched.content_type,
                    kind: AttachmentType::File,
                },
            );
        }

        for url in extract_urls(&message.content) {
            ids.push(self.capture_embed(&url, archive).await);
        }

        Ok(ids)
    }

    /// Download one embedded URL. Never fails: a link that cannot be fetched
    /// or stored is recorded without a local file.
    async fn capture_embed(&self, url: &str, archive: &mut ArchiveFile) -> String {
        let id = generate_id();

        let (new_path, mime) = match self.fetcher.fetch(url).await {
            Ok(fetched) => {
                let file_name = with_extension(&id, fetched.content_type.as_deref());
                let relative = format!("{ATTACHMENTS_DIR}/{file_name}");
                match self.fs.write(&archive.path.join(&relative), &fetched.bytes).await {
                    Ok(()) => (Some(relative), fetched.content_type),
                    Err(e) => {
                        warn!(url = %url, "Embedded link downloaded but not stored: {e}");
                        (None, fetched.content_type)
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, "Embedded link not downloaded: {e}");
                (None, Some(UNKNOWN_MIME.to_string()))
            }
        };

        archive.attachments.insert(
            id.clone(),
            ArchiveAttachment {
                id: id.clone(),
                original_name: original_name(url),
                original_url: url.to_string(),
                new_path,
                mime,
                kind: AttachmentType::Url,
            },
        );

        id
    }

    /// Capture the author and everything the message references, then record
    /// the message itself.
    ///
    /// # Errors
    ///
    /// Propagates any fatal capture failure.
    pub async fn transcribe(
        &self,
        message: &ChannelMessage,
        archive: &mut ArchiveFile,
    ) -> Result<(), ArchiveError> {
        self.capture_user(&message.author, archive).await?;
        let attachments = self.capture_attachments(message, archive).await?;

        archive.messages.insert(
            message.id.clone(),
            ArchiveMessage {
                sender: message.author.id.clone(),
                content: message.clean_content.clone(),
                original_content: message.content.clone(),
                attachments,
                sent: message.created_at,
                edited: message.edited_at,
            },
        );

        Ok(())
    }
}
