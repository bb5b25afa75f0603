//! The two storage tiers behind [`crate::ImageCache`].

pub mod discardable;
/// Persistent per-key file store.
pub mod disk;
/// Discardable in-memory entries.
pub mod memory;
pub(crate) mod stats;

pub use discardable::*;
pub use disk::*;
pub use memory::*;
pub use stats::CacheStatsSnapshot;
