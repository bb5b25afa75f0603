//! # imgtier-core
//!
//! A two-tier image cache. Decoded images live in a memory tier whose
//! entries can be reclaimed under memory pressure at any time; encoded
//! copies live in a disk tier, one file per key, that survives restarts.
//!
//! ## Architecture
//!
//! - [`tier::DiscardableContent`]: reference-counted payload slot implementing
//!   the check-out / check-in [`tier::Discardable`] protocol.
//! - [`tier::MemoryTier`]: concurrent key → discardable image map with a
//!   reclamation pass ([`tier::MemoryTier::discard_unused`]).
//! - [`tier::DiskTier`]: key → file store under a fixed root with atomic
//!   overwrites.
//! - [`ImageCache`]: the coordinator. Reads are memory-first and may promote
//!   disk hits; writes and removals fan out per [`CachePolicy`].
//! - [`pressure::MemoryPressureMonitor`]: polls available system memory and
//!   triggers reclamation.
//!
//! ## Example
//!
//! ```no_run
//! use imgtier_core::{CacheKey, CachePolicy, ImageCache, ImageCacheOptions};
//!
//! async fn warm(image: imgtier_core::CachedImage) -> imgtier_core::Result<()> {
//!     let cache = ImageCache::open(ImageCacheOptions::platform_default()?)?;
//!     let key = CacheKey::new("cat1.jpg")?;
//!
//!     cache.set(&key, image, CachePolicy::MemoryAndDisk).await;
//!     assert!(cache.get(&key, CachePolicy::Memory).await.is_some());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod coordinator;
/// Error type shared by the cache.
pub mod error;
/// Cache keys and how they are derived from URLs.
pub mod key;
/// Tier selection and promotion rules.
pub mod policy;
pub mod pressure;
pub mod tier;
/// Byte quantities.
pub mod units;

pub use codec::{CachedImage, ImageCodec};
pub use coordinator::{ImageCache, ImageCacheOptions};
pub use error::{CacheError, Result};
pub use key::{CacheKey, KeyStrategy};
pub use policy::{CachePolicy, PromotionMode};
pub use pressure::{MemoryPressureMonitor, MemoryProbe, PressureOptions, SystemMemoryProbe};
pub use units::ByteSize;
