//! Configuration module.
//!
//! Handles loading, validating, and merging `thumbworks.toml`. User values
//! are merged over stock defaults, unknown keys are rejected, and every
//! declared variant is validated up front so a typo fails at load time rather
//! than halfway through a batch.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnails]
//! format = "JPEG"       # Output format for processed images
//! quality = 85          # JPEG quality (0-100)
//! dirname = "thumbs"    # Variant subdirectory ("" = next to the source)
//!
//! [processing]
//! max_processes = 4     # Max parallel workers (omit for auto = CPU cores)
//!
//! # Optional: process the source image itself
//! [source]
//! size = "1600x"
//!
//! # Named variants, one table each
//! [variants.small]
//! size = "200x200"
//! sharpen = true
//! ```
//!
//! The `[source]` and `[variants.*]` tables are processing options; see
//! [`options`](crate::options) for their keys.

use crate::error::ThumbnailError;
use crate::imaging::Format;
use crate::options::{self, VariantSpec};
use crate::process::ThumbnailSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    Validation(String),
    #[error(transparent)]
    Options(#[from] ThumbnailError),
}

/// Configuration loaded from `thumbworks.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Process-wide encoding and naming settings.
    pub thumbnails: ThumbnailsConfig,
    pub processing: ProcessingConfig,
    /// Processing options for the source image; absent = store unprocessed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<toml::Value>,
    /// Variant identifier → processing options.
    pub variants: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Check value ranges and every option table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thumbnails.validate()?;
        self.thumbnail_set()?;
        Ok(())
    }

    /// Validate the `[source]` and `[variants.*]` tables into a [`ThumbnailSet`].
    pub fn thumbnail_set(&self) -> Result<ThumbnailSet, ThumbnailError> {
        let format = &self.thumbnails.format;
        let source = options::validate(self.source.as_ref(), false, format)?;

        let mut set = ThumbnailSet::new(source);
        for (name, raw) in &self.variants {
            let spec = VariantSpec::from_raw(name, Some(raw), format)?;
            if set.variant(spec.identifier()).is_some() {
                return Err(ThumbnailError::InvalidOption(format!(
                    "variant `{name}` collides with `{}`",
                    spec.identifier()
                )));
            }
            set = set.with_variant(spec);
        }
        Ok(set)
    }
}

/// Encoding and naming settings shared by every image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Default output format when an option table omits `format`.
    pub format: Format,
    /// JPEG quality, 0-100.
    pub quality: u32,
    /// Subdirectory for variants, relative to the source's directory.
    /// Empty places variants next to the source.
    pub dirname: String,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            format: Format::jpeg(),
            quality: 85,
            dirname: "thumbs".to_string(),
        }
    }
}

impl ThumbnailsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 0-100".into(),
            ));
        }
        if self.format.is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.format must not be empty".into(),
            ));
        }
        if self.dirname.starts_with('/') || self.dirname.split('/').any(|part| part == "..") {
            return Err(ConfigError::Validation(
                "thumbnails.dirname must be a relative path inside the source directory".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on rayon workers; `None` uses every core.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: `max_processes` clamped to `1..=cores`.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Loading
// =============================================================================

/// [`Config::default`] as a TOML table, the bottom layer user files merge onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Deep-merge `overlay` onto `base`. Tables merge per key; any other overlay
/// value replaces the base value outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// A file that exists but fails to parse is an error.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Apply `overlay` (if any) to `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Printed by `thumbworks gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbworks.toml
#
# Every key is optional. Values shown are the defaults.

[thumbnails]
# Output format used when an option table does not set `format`.
# Any format the codec can write: JPEG, PNG, GIF, BMP, TIFF, WEBP, AVIF.
format = "JPEG"

# JPEG quality, 0-100. Other formats use their codec defaults.
quality = 85

# Variants are written to <source dir>/<dirname>/<stem>.<variant>.<ext>.
# Set to "" to write them next to the source instead.
dirname = "thumbs"

[processing]
# Maximum parallel workers when rendering variants.
# Omit to use all CPU cores; larger values are clamped to the core count.
# max_processes = 4

# Processing options for the source image itself. Leave the table out to
# store sources untouched.
#
# [source]
# size = "1600x"        # WxH; either side may be empty to keep the aspect ratio
# sharpen = false
# detail = false
# upscale = false       # allow enlarging images smaller than `size`
# format = "JPEG"

# One table per variant. Identifiers become part of the file name:
# images/photo.jpg → images/thumbs/photo.small.jpg
#
# [variants.small]
# size = "200x200"      # both sides set: centered crop to the exact frame
# sharpen = true
"##
}
