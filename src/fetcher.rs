//! Byte downloads for avatars, attachments and embedded links.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::constants::ARCHIVER_USER_AGENT;

/// A downloaded payload and its declared content type.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// The `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Something that can GET a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status. A 404 is
    /// a failure like any other, so a missing avatar or native attachment
    /// aborts the run rather than archiving an error page.
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;
}

/// `Fetcher` backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(ARCHIVER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        debug!(url = %url, "Fetching resource");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        Ok(Fetched {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
