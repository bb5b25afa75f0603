use std::path::PathBuf;

use imgtier_core::{
    ByteSize, ImageCacheOptions, KeyStrategy, PressureOptions, PromotionMode,
    Result as CacheResult, codec::MAX_JPEG_QUALITY,
    tier::{DEFAULT_DIRECTORY_NAME, DiskCacheRoot},
};
use serde::{Deserialize, Serialize};

use crate::validation::{self, ConfigGuardRailError};

/// Top-level cache configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageCacheConfig {
    /// Disk tier location and encoding.
    pub disk: DiskSection,
    /// Memory tier behaviour.
    pub memory: MemorySection,
    /// Memory pressure polling.
    pub pressure: PressureSection,
    /// URL to cache key derivation.
    pub keys: KeySection,
}

/// `[disk]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskSection {
    /// Replaces the platform caches directory. Leave unset to use
    /// `~/.cache` on Linux, `~/Library/Caches` on macOS, and so on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caches_dir: Option<PathBuf>,
    /// Directory created inside the caches directory.
    pub directory_name: String,
    /// JPEG quality for encoded entries, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for DiskSection {
    fn default() -> Self {
        Self {
            caches_dir: None,
            directory_name: DEFAULT_DIRECTORY_NAME.to_string(),
            jpeg_quality: MAX_JPEG_QUALITY,
        }
    }
}

/// `[memory]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MemorySection {
    /// Whether disk-only lookups also copy hits into memory.
    pub promotion: PromotionSetting,
}

/// Serialized form of [`PromotionMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromotionSetting {
    /// Promote only on lookups that select both tiers.
    #[default]
    CombinedOnly,
    /// Promote on every disk hit.
    Always,
}

impl From<PromotionSetting> for PromotionMode {
    fn from(value: PromotionSetting) -> Self {
        match value {
            PromotionSetting::CombinedOnly => PromotionMode::CombinedOnly,
            PromotionSetting::Always => PromotionMode::Always,
        }
    }
}

/// `[pressure]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PressureSection {
    /// Start the pressure monitor at all.
    pub enabled: bool,
    /// How often available memory is sampled, e.g. `"5s"` or `"750ms"`.
    pub poll_interval: String,
    /// Purge discardable entries while available memory is below this.
    pub min_available_mib: u64,
}

impl Default for PressureSection {
    fn default() -> Self {
        let defaults = PressureOptions::defaults();
        Self {
            enabled: true,
            poll_interval: humantime::format_duration(defaults.poll_interval)
                .to_string(),
            min_available_mib: defaults.min_available.whole_mib(),
        }
    }
}

/// `[keys]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeySection {
    /// How cache keys are derived from URLs.
    pub strategy: KeyStrategySetting,
}

/// Serialized form of [`KeyStrategy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategySetting {
    /// Last URL path segment, verbatim. Distinct URLs ending in the same
    /// segment collide.
    #[default]
    LastSegment,
    /// SHA-256 of the whole URL.
    Hashed,
}

impl From<KeyStrategySetting> for KeyStrategy {
    fn from(value: KeyStrategySetting) -> Self {
        match value {
            KeyStrategySetting::LastSegment => KeyStrategy::LastPathSegment,
            KeyStrategySetting::Hashed => KeyStrategy::HashedLocator,
        }
    }
}

impl ImageCacheConfig {
    /// Check every value against its guard rail.
    pub fn validate(&self) -> Result<(), ConfigGuardRailError> {
        validation::validate(self)
    }

    /// Disk root: `<caches_dir>/<directory_name>`, falling back to the
    /// platform caches directory.
    pub fn disk_root(&self) -> CacheResult<DiskCacheRoot> {
        match &self.disk.caches_dir {
            Some(dir) => Ok(DiskCacheRoot::new(dir.join(&self.disk.directory_name))),
            None => DiskCacheRoot::platform_default(&self.disk.directory_name),
        }
    }

    /// Options for [`imgtier_core::ImageCache::open`].
    pub fn cache_options(&self) -> CacheResult<ImageCacheOptions> {
        Ok(ImageCacheOptions {
            disk_root: self.disk_root()?,
            jpeg_quality: self.disk.jpeg_quality,
            promotion: self.memory.promotion.into(),
        })
    }

    /// `None` when pressure polling is disabled.
    pub fn pressure_options(
        &self,
    ) -> Result<Option<PressureOptions>, ConfigGuardRailError> {
        if !self.pressure.enabled {
            return Ok(None);
        }
        Ok(Some(PressureOptions {
            poll_interval: validation::parse_poll_interval(
                &self.pressure.poll_interval,
            )?,
            min_available: ByteSize::from_mib(self.pressure.min_available_mib),
        }))
    }

    /// Key strategy for loaders built from this config.
    pub fn key_strategy(&self) -> KeyStrategy {
        self.keys.strategy.into()
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
