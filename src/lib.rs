//! Chat channel archiver library.
//!
//! Pages through a channel's message history, downloads attachments, avatars
//! and linked media, and writes a JSON snapshot next to the downloaded files.

pub mod archive;
pub mod capture;
pub mod config;
pub mod constants;
pub mod discord;
pub mod error;
pub mod fetcher;
pub mod links;
pub mod model;
pub mod naming;
pub mod package;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod storage;

pub use capture::Archiver;
pub use error::ArchiveError;
pub use model::{ArchiveAttachment, ArchiveFile, ArchiveMessage, ArchiveUser, AttachmentType};
pub use pipeline::{archive_channel, Paginator};
