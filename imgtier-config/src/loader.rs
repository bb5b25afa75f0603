use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};

use crate::models::ImageCacheConfig;

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// No file was found; built-in defaults are in use.
    #[default]
    Default,
    /// Loaded from this file.
    File(PathBuf),
}

/// Read, parse and validate a TOML config file.
pub fn load_from_file(path: &Path) -> anyhow::Result<ImageCacheConfig> {
    let contents = fs::read_to_string(path).with_context(|| {
        format!("failed to read image cache config from {}", path.display())
    })?;
    parse_from_str(&contents, &path.display().to_string())
}

/// Like [`load_from_file`], but a missing file yields the defaults.
/// A file that exists and is malformed is still an error.
pub fn load_or_default(
    path: &Path,
) -> anyhow::Result<(ImageCacheConfig, ConfigSource)> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let config =
                parse_from_str(&contents, &path.display().to_string())?;
            log::debug!("loaded image cache config; path={}", path.display());
            Ok((config, ConfigSource::File(path.to_path_buf())))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!(
                "no image cache config at {}; using defaults",
                path.display()
            );
            Ok((ImageCacheConfig::default(), ConfigSource::Default))
        }
        Err(err) => Err(err).with_context(|| {
            format!("failed to read image cache config from {}", path.display())
        }),
    }
}

/// Parse and validate TOML text. `origin` names the source in errors.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> anyhow::Result<ImageCacheConfig> {
    let config: ImageCacheConfig = toml::from_str(contents).map_err(|err| {
        anyhow!("invalid image cache config {}: {}", origin, err)
    })?;
    config
        .validate()
        .with_context(|| format!("image cache config {} rejected", origin))?;
    Ok(config)
}
