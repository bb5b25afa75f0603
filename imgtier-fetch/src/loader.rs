use std::sync::Arc;

use imgtier_core::{CacheKey, CachePolicy, CachedImage, ImageCache, KeyStrategy};
use url::Url;

use crate::{error::FetchError, fetcher::ImageFetcher};

/// Which step of [`ImageLoader::load`] produced the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Live memory entry.
    Memory,
    /// Disk entry, copied into memory.
    Disk,
    /// Fetched, then stored in both tiers.
    Network,
}

/// A loaded image with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Key the image is cached under.
    pub key: CacheKey,
    /// The decoded image.
    pub image: CachedImage,
    /// Which step served it.
    pub source: LoadSource,
}

/// Cache-then-network image loader.
///
/// Concurrent loads of the same URL each fetch independently; the last
/// writer wins in both tiers.
#[derive(Debug)]
pub struct ImageLoader<F> {
    cache: Arc<ImageCache>,
    fetcher: F,
    keys: KeyStrategy,
}

impl<F: ImageFetcher> ImageLoader<F> {
    /// Loader using last-path-segment keys.
    pub fn new(cache: Arc<ImageCache>, fetcher: F) -> Self {
        Self::with_key_strategy(cache, fetcher, KeyStrategy::default())
    }

    /// Loader with an explicit key strategy.
    pub fn with_key_strategy(
        cache: Arc<ImageCache>,
        fetcher: F,
        keys: KeyStrategy,
    ) -> Self {
        Self {
            cache,
            fetcher,
            keys,
        }
    }

    /// The cache being filled.
    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// How URLs map to keys.
    pub fn key_strategy(&self) -> KeyStrategy {
        self.keys
    }

    /// Load `url`, returning only the image.
    pub async fn load(&self, url: &Url) -> Result<CachedImage, FetchError> {
        Ok(self.load_traced(url).await?.image)
    }

    /// Memory, then disk (copying hits into memory), then the network. A
    /// fetched image is stored in both tiers before it is returned.
    pub async fn load_traced(&self, url: &Url) -> Result<LoadedImage, FetchError> {
        let key = self.keys.key_for(url).map_err(|e| match e {
            imgtier_core::CacheError::InvalidKey(_) => FetchError::NoKey(url.clone()),
            other => other.into(),
        })?;

        if let Some(image) = self.cache.get(&key, CachePolicy::Memory).await {
            return Ok(LoadedImage {
                key,
                image,
                source: LoadSource::Memory,
            });
        }

        if let Some(image) = self.cache.get(&key, CachePolicy::Disk).await {
            self.cache.promote(&key, image.clone());
            return Ok(LoadedImage {
                key,
                image,
                source: LoadSource::Disk,
            });
        }

        let bytes = self.fetcher.fetch_bytes(url).await?;
        let codec = self.cache.codec();
        let image = tokio::task::spawn_blocking(move || codec.decode(&bytes)).await??;
        log::debug!(
            "fetched image; key={}, width={}, height={}",
            key,
            image.width(),
            image.height()
        );

        self.cache
            .set(&key, image.clone(), CachePolicy::MemoryAndDisk)
            .await;
        Ok(LoadedImage {
            key,
            image,
            source: LoadSource::Network,
        })
    }
}
