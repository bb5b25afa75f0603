use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the cache and its tiers.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The disk tier could not create or resolve its storage root.
    ///
    /// This is the only error a cache constructor surfaces; a cache without
    /// its root directory cannot operate.
    #[error("failed to initialize cache directory {path:?}: {source}")]
    DirectoryInit {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// A key that cannot be used as a filename.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encode or decode failure.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// A blocking-pool task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Join(err.to_string())
    }
}

/// Result alias for [`CacheError`].
pub type Result<T> = std::result::Result<T, CacheError>;
