//! Shared fixtures for core integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use imgtier_core::{
    CacheKey, CachedImage, ImageCache, ImageCacheOptions, PromotionMode,
    tier::DiskCacheRoot,
};
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// A cache rooted in a fresh temp dir. Keep the dir alive for the test.
pub struct TestCache {
    pub dir: TempDir,
    pub cache: ImageCache,
}

impl TestCache {
    pub fn new() -> Self {
        Self::with_promotion(PromotionMode::CombinedOnly)
    }

    pub fn with_promotion(promotion: PromotionMode) -> Self {
        init_logging();
        let dir = tempfile::tempdir().expect("temp dir");
        let mut options = ImageCacheOptions::with_root(DiskCacheRoot::new(
            dir.path().join("ImageCache"),
        ));
        options.promotion = promotion;
        let cache = ImageCache::open(options).expect("open cache");
        Self { dir, cache }
    }

    /// Same disk root, empty memory tier: what a process restart looks like.
    pub fn reopen(&self) -> ImageCache {
        ImageCache::open(ImageCacheOptions::with_root(
            self.cache.disk().root().clone(),
        ))
        .expect("reopen cache")
    }
}

pub fn key(s: &str) -> CacheKey {
    CacheKey::new(s).expect("valid key")
}

/// Horizontal gradient; survives JPEG round trips with a recognisable shape.
pub fn gradient(width: u32, height: u32) -> CachedImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    CachedImage::new(DynamicImage::ImageRgb8(img))
}
