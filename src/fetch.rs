// fastresize/src/fetch.rs

//! Remote input fetching.
//!
//! The pipeline only ever consumes fully materialized local files, so
//! remote bodies are spooled into a temp file before decoding starts. All
//! network-side failures, including unparsable URLs and schemes we have no
//! transport for, surface as [`ResizeError::FetchFailure`].

use crate::core::{ResizeError, Result};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use tempfile::NamedTempFile;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 4;

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("fastresize/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResizeError::FetchFailure(e.to_string()))?;
        Ok(Fetcher { client })
    }

    /// Download `uri` into a fresh temp file and hand the file back.
    pub fn fetch_to_temp(&self, uri: &str) -> Result<NamedTempFile> {
        let url = reqwest::Url::parse(uri)
            .map_err(|e| ResizeError::FetchFailure(format!("invalid url {uri}: {e}")))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ResizeError::FetchFailure(format!(
                    "unsupported url scheme: {scheme}"
                )))
            }
        }

        log::debug!("fetching {url}");
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ResizeError::FetchFailure(e.to_string()))?;

        let mut spool = NamedTempFile::new()?;
        let bytes = response
            .copy_to(spool.as_file_mut())
            .map_err(|e| ResizeError::FetchFailure(e.to_string()))?;
        log::debug!("fetched {bytes} bytes to {}", spool.path().display());
        Ok(spool)
    }
}
