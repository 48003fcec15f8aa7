//! HTTP access to index and detail pages.
//!
//! The harvester is generic over [`PageFetcher`] so tests can serve canned
//! markup; production runs use [`HttpFetcher`], a thin wrapper around one
//! shared `reqwest::Client`.

use crate::error::{HarvestError, Result};
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetch a page body by absolute URL.
///
/// Implementors are driven on a single-threaded runtime, so the returned
/// futures carry no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
