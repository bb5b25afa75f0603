//! Fills an [`imgtier_core::ImageCache`] from the network.
//!
//! [`ImageLoader::load`] resolves a URL to a cache key, serves it from
//! memory or disk when possible, and otherwise downloads, decodes and
//! stores it in both tiers.

/// Fetch error type.
pub mod error;
/// Byte sources.
pub mod fetcher;
/// Cache-then-network loading.
pub mod loader;

pub use error::FetchError;
pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use loader::{ImageLoader, LoadSource, LoadedImage};
