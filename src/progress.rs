//! Progress reporting for archive runs.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

/// A progress update emitted by the pagination loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A page was transcribed; `processed` is the running total.
    Page { processed: usize },
    /// History is exhausted.
    Done { processed: usize },
}

impl ProgressEvent {
    #[must_use]
    pub fn processed(&self) -> usize {
        match self {
            Self::Page { processed } | Self::Done { processed } => *processed,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page { processed } => write!(f, "Progress: {processed}/?"),
            Self::Done { processed } => write!(f, "Total processed: {processed}! Done."),
        }
    }
}

/// Receives progress updates. Delivery is best effort and never fails the run.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: ProgressEvent);
}

/// Logs each update.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    pub channel_id: String,
}

#[async_trait]
impl ProgressSink for LogProgress {
    async fn report(&self, event: ProgressEvent) {
        info!(channel_id = %self.channel_id, processed = event.processed(), "{event}");
    }
}

#[async_trait]
impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    async fn report(&self, event: ProgressEvent) {
        // Receiver gone just means nobody is listening any more.
        let _ = self.send(event);
    }
}
