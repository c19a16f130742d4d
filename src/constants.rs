//! Shared constants used across the application.

/// User agent string used for media download requests.
pub const ARCHIVER_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; channel-archiver/0.1; +https://github.com/channel-archiver)";

/// Number of messages requested per history page. A shorter page ends the run.
pub const PAGE_SIZE: usize = 50;

/// Largest avatar resolution the CDN serves.
pub const AVATAR_SIZE: u32 = 4096;

/// Content type recorded for avatars (always requested as webp).
pub const AVATAR_MIME: &str = "image/webp";

/// Content type recorded for embedded URLs that could not be downloaded.
pub const UNKNOWN_MIME: &str = "unknown";

/// Subdirectory of the archive root holding downloaded files.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Snapshot file written at the archive root.
pub const INFO_FILE: &str = "info.json";

/// Number of random bytes behind each generated id (hex encoded to 48 chars).
pub const ID_BYTES: usize = 24;
