use imgtier_core::CacheError;
use thiserror::Error;
use url::Url;

/// Errors from loading an image through the network.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or its body read.
    #[error("HTTP request for {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: Url,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// Requested URL.
        url: Url,
        /// HTTP status code.
        status: u16,
    },

    /// No cache key can be derived from the URL.
    #[error("no cache key can be derived from {0}")]
    NoKey(Url),

    /// Decoding or a cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Anything else, such as client construction.
    #[error("{0}")]
    Other(String),
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(err: tokio::task::JoinError) -> Self {
        FetchError::Cache(err.into())
    }
}
