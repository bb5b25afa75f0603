use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

const DEFAULT_USER_AGENT: &str =
    concat!("imgtier/", env!("CARGO_PKG_VERSION"));

/// Source of encoded image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: ImageFetcher + ?Sized> ImageFetcher for Arc<T> {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_bytes(url).await
    }
}

/// Plain HTTP GET over `reqwest`. No retries.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Client with a 30 s timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| {
                FetchError::Other(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        log::debug!("fetching image; url={}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|source| {
            FetchError::Http {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("image fetch failed; url={}, status={}", url, status);
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}
