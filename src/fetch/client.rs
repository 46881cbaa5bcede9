//! HTTP fetch boundary. Houses the `FetchClient` trait consumed by the
//! dispatcher and the reqwest-backed implementation used by the binary.

use crate::runtime::config::TallyConfig;
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt;

/// Errors surfaced by [`FetchClient`] implementations.
///
/// The dispatcher treats every variant the same way: log it, contribute zero,
/// release the slot. The variants exist so operators can tell a timeout from
/// an HTTP status from a transport failure.
#[derive(Debug)]
pub enum FetchError {
    Timeout { url: String },
    Status { url: String, code: u16 },
    Transport { url: String, source: reqwest::Error },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout { url } => write!(f, "fetching {url} timed out"),
            FetchError::Status { url, code } => {
                write!(f, "fetching {url} returned HTTP status {code}")
            }
            FetchError::Transport { url, source } => {
                write!(f, "fetching {url} failed: {source}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Opaque "fetch content by identifier" operation. May be slow; may fail.
pub trait FetchClient: Send + Sync + 'static {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>>;
}

/// GET client with a per-request timeout taken from the runtime config.
#[derive(Debug, Clone)]
pub struct HttpFetchClient {
    client: reqwest::Client,
}

impl HttpFetchClient {
    pub fn from_config(config: &TallyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| classify(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                code: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|err| classify(url, err))
    }
}

impl FetchClient for HttpFetchClient {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>> {
        Box::pin(self.get(url))
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_owned(),
        }
    } else {
        FetchError::Transport {
            url: url.to_owned(),
            source: err,
        }
    }
}
