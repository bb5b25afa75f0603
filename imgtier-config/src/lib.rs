//! Configuration for the imgtier image cache.
//!
//! A single TOML file describes the disk root, encode quality, promotion
//! behaviour, memory pressure polling and key derivation. Missing sections
//! fall back to defaults; values are validated before they are turned into
//! [`imgtier_core`] options.

/// Reading config files from disk.
pub mod loader;
/// The TOML data model.
pub mod models;
/// Guard rails applied after parsing.
pub mod validation;

pub use loader::{ConfigSource, load_from_file, load_or_default, parse_from_str};
pub use models::{
    DiskSection, ImageCacheConfig, KeySection, KeyStrategySetting,
    MemorySection, PressureSection, PromotionSetting,
};
pub use validation::ConfigGuardRailError;
