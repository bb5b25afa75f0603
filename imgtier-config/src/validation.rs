use std::time::Duration;

use thiserror::Error;

use crate::models::ImageCacheConfig;

/// A configuration value that would leave the cache unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    /// Quality outside 1..=100.
    #[error("disk.jpeg_quality must be within 1..=100, got {0}")]
    JpegQuality(u8),

    /// Directory name that is not a single clean path component.
    #[error("disk.directory_name must be one path component with no surrounding whitespace, got {0:?}")]
    DirectoryName(String),

    /// Poll interval that humantime cannot parse.
    #[error("pressure.poll_interval {value:?} is not a duration: {reason}")]
    PollInterval {
        /// The configured text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Poll interval of zero.
    #[error("pressure.poll_interval must be greater than zero")]
    ZeroPollInterval,
}

/// Validate a parsed config. Pressure settings are only checked when enabled.
pub fn validate(config: &ImageCacheConfig) -> Result<(), ConfigGuardRailError> {
    let quality = config.disk.jpeg_quality;
    if !(1..=100).contains(&quality) {
        return Err(ConfigGuardRailError::JpegQuality(quality));
    }

    let name = config.disk.directory_name.as_str();
    if name.is_empty()
        || name.trim() != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
    {
        return Err(ConfigGuardRailError::DirectoryName(
            config.disk.directory_name.clone(),
        ));
    }

    if config.pressure.enabled {
        parse_poll_interval(&config.pressure.poll_interval)?;
    }
    Ok(())
}

/// Parse a humantime duration such as `"5s"` and reject zero.
pub fn parse_poll_interval(raw: &str) -> Result<Duration, ConfigGuardRailError> {
    let interval = humantime::parse_duration(raw.trim()).map_err(|err| {
        ConfigGuardRailError::PollInterval {
            value: raw.to_string(),
            reason: err.to_string(),
        }
    })?;
    if interval.is_zero() {
        return Err(ConfigGuardRailError::ZeroPollInterval);
    }
    Ok(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        assert_eq!(validate(&ImageCacheConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let mut config = ImageCacheConfig::default();
        config.disk.jpeg_quality = 0;
        assert_eq!(validate(&config), Err(ConfigGuardRailError::JpegQuality(0)));
        config.disk.jpeg_quality = 101;
        assert_eq!(
            validate(&config),
            Err(ConfigGuardRailError::JpegQuality(101))
        );
    }

    #[test]
    fn rejects_nested_or_empty_directory_names() {
        for bad in ["", "  ", "..", "a/b", "a\\b", " ImageCache ", "ImageCache\n"] {
            let mut config = ImageCacheConfig::default();
            config.disk.directory_name = bad.to_string();
            assert!(
                matches!(
                    validate(&config),
                    Err(ConfigGuardRailError::DirectoryName(_))
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn poll_interval_must_parse_and_be_positive() {
        assert_eq!(parse_poll_interval("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(
            parse_poll_interval("0s"),
            Err(ConfigGuardRailError::ZeroPollInterval)
        );
        assert!(matches!(
            parse_poll_interval("soon"),
            Err(ConfigGuardRailError::PollInterval { .. })
        ));
    }
}
