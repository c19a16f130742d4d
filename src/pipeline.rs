//! Walking a channel's history from newest to oldest.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::archive::{create_archive, persist};
use crate::capture::Archiver;
use crate::constants::PAGE_SIZE;
use crate::error::ArchiveError;
use crate::model::ArchiveFile;
use crate::platform::{ChannelMessage, HistorySource};
use crate::progress::{ProgressEvent, ProgressSink};

/// Cursor state for paging backwards through history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    /// Id of the oldest message seen so far; `None` before the first page.
    cursor: Option<String>,
    page_size: usize,
    processed: usize,
    exhausted: bool,
}

impl Paginator {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            cursor: None,
            page_size,
            processed: 0,
            exhausted: false,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// True once a short page has been seen.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Record a fully processed page.
    ///
    /// The cursor moves to the last (oldest) message of the page. A page
    /// shorter than the page size, including an empty one, ends the walk.
    pub fn advance(&mut self, page: &[ChannelMessage]) {
        if let Some(oldest) = page.last() {
            self.cursor = Some(oldest.id.clone());
        }
        self.processed += page.len();
        if page.len() < self.page_size {
            self.exhausted = true;
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

/// Transcribe every message `source` yields into `archive`.
///
/// Returns the number of messages processed. A history failure aborts
/// immediately; messages from earlier pages stay in `archive`.
///
/// # Errors
///
/// Propagates history, avatar, attachment and storage failures.
pub async fn transcribe_history(
    source: &dyn HistorySource,
    archiver: &Archiver<'_>,
    archive: &mut ArchiveFile,
    progress: Option<&dyn ProgressSink>,
) -> Result<usize, ArchiveError> {
    let mut paginator = Paginator::default();

    while !paginator.is_exhausted() {
        let page = source
            .fetch_page(paginator.cursor(), paginator.page_size())
            .await?;
        debug!(
            cursor = paginator.cursor().unwrap_or("<head>"),
            size = page.len(),
            "Fetched history page"
        );

        for message in &page {
            archiver.transcribe(message, archive).await?;
        }
        paginator.advance(&page);

        let event = ProgressEvent::Page {
            processed: paginator.processed(),
        };
        debug!(processed = paginator.processed(), "{event}");
        if let Some(sink) = progress {
            sink.report(event).await;
        }
    }

    Ok(paginator.processed())
}

/// Archive a whole channel into a fresh directory at `root`.
///
/// Creates the directory layout, walks the history, writes `info.json` and
/// returns the populated archive.
///
/// # Errors
///
/// Any fatal failure aborts the run; nothing is persisted in that case.
pub async fn archive_channel(
    source: &dyn HistorySource,
    archiver: &Archiver<'_>,
    root: PathBuf,
    progress: Option<&dyn ProgressSink>,
) -> Result<ArchiveFile, ArchiveError> {
    info!(path = %root.display(), "Starting archive run");

    let mut archive = create_archive(archiver.fs, root).await?;
    let processed = transcribe_history(source, archiver, &mut archive, progress).await?;

    let event = ProgressEvent::Done { processed };
    debug!(processed, "{event}");
    if let Some(sink) = progress {
        sink.report(event).await;
    }

    persist(archiver.fs, &archive).await?;
    Ok(archive)
}
