use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{CacheError, Result};

const MAX_KEY_BYTES: usize = 255;

/// Stable identifier of one logical image.
///
/// The same string addresses the memory tier and names the file in the disk
/// tier, so construction rejects anything that is not a plain filename.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Validate `key` as a plain filename.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate(&key)?;
        Ok(Self(key))
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap the key text.
    pub fn into_string(self) -> String {
        self.0
    }
}

fn validate(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key is empty".to_string()));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(CacheError::InvalidKey(format!(
            "key is {} bytes, limit is {MAX_KEY_BYTES}",
            key.len()
        )));
    }
    if key.starts_with('.') {
        return Err(CacheError::InvalidKey(format!(
            "key may not start with '.': {key}"
        )));
    }
    if key.contains(['/', '\\', '\0']) {
        return Err(CacheError::InvalidKey(format!(
            "key contains a path separator or NUL: {key:?}"
        )));
    }
    Ok(())
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.0).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CacheKey {
    type Error = CacheError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// How a resource locator is turned into a [`CacheKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Use the final non-empty path segment verbatim.
    ///
    /// Two locators that end in the same segment share one cache entry and
    /// overwrite each other.
    #[default]
    LastPathSegment,
    /// SHA-256 of the full locator, hex encoded.
    HashedLocator,
}

impl KeyStrategy {
    /// Derive the key for `url`.
    pub fn key_for(self, url: &Url) -> Result<CacheKey> {
        match self {
            KeyStrategy::LastPathSegment => key_from_last_segment(url),
            KeyStrategy::HashedLocator => Ok(key_from_hashed_locator(url)),
        }
    }
}

/// Build a key from the last path segment of `url`.
///
/// Percent-encoded segments are used as they appear in the URL, which keeps
/// an encoded `%2F` from turning into a path separator on disk.
pub fn key_from_last_segment(url: &Url) -> Result<CacheKey> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| {
            CacheError::InvalidKey(format!("url has no path segment: {url}"))
        })?;
    CacheKey::new(segment)
}

/// Hex SHA-256 of the whole URL. Always a valid key.
pub fn key_from_hashed_locator(url: &Url) -> CacheKey {
    let digest = Sha256::digest(url.as_str().as_bytes());
    CacheKey(hex::encode(digest))
}
