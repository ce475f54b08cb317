//! Output path resolution for sources and their variants.
//!
//! Names are storage names, always joined with `/` regardless of platform:
//!
//! - `images/photo.jpg` + PNG source options → `images/photo.png`
//! - `images/photo.jpg` + variant `small` (JPEG) → `images/thumbs/photo.small.jpg`
//!
//! The extension comes from, in order of precedence: an explicit `force_ext`,
//! the output format in the options, the base name's own extension.

use crate::config::ThumbnailsConfig;
use crate::error::{Result, ThumbnailError};
use crate::options::ProcessingOptions;
use tracing::debug;

/// A storage name split into directory, stem and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileParts {
    /// Everything before the last `/`, empty for top-level names.
    pub directory: String,
    pub stem: String,
    /// Extension including the dot, or empty.
    pub extension: String,
}

impl FileParts {
    /// Split `name`. Only the last dot of the file name starts the
    /// extension, and a leading dot (`.hidden`) belongs to the stem.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(ThumbnailError::InvalidPath("empty name".into()));
        }
        let (directory, file_name) = match name.rfind('/') {
            // Keep the root of absolute names: "/photo.jpg" lives in "/"
            Some(0) => ("/", &name[1..]),
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("", name),
        };
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return Err(ThumbnailError::InvalidPath(format!(
                "`{name}` has no file name"
            )));
        }
        let (stem, extension) = match file_name.rfind('.') {
            Some(pos) if pos > 0 => (&file_name[..pos], &file_name[pos..]),
            _ => (file_name, ""),
        };
        Ok(Self {
            directory: directory.to_string(),
            stem: stem.to_string(),
            extension: extension.to_string(),
        })
    }
}

/// Extension for images produced with `options`.
pub fn image_extension(options: &ProcessingOptions) -> String {
    options.format.extension()
}

/// Resolve the storage name for a source (`identifier = None`) or one of
/// its variants.
pub fn resolve_path(
    base_name: &str,
    identifier: Option<&str>,
    options: Option<&ProcessingOptions>,
    force_ext: Option<&str>,
    config: &ThumbnailsConfig,
) -> Result<String> {
    let parts = FileParts::parse(base_name)?;

    let extension = match (force_ext, options) {
        (Some(forced), options) => {
            let forced = if forced.is_empty() || forced.starts_with('.') {
                forced.to_string()
            } else {
                format!(".{forced}")
            };
            if let Some(options) = options {
                debug!(
                    name = base_name,
                    forced = %forced,
                    format = %options.format,
                    "forced extension overrides output format"
                );
            }
            forced
        }
        (None, Some(options)) => image_extension(options),
        (None, None) => parts.extension.clone(),
    };

    let file_name = match identifier {
        Some(id) => format!("{}.{id}{extension}", parts.stem),
        None => format!("{}{extension}", parts.stem),
    };

    // A root directory trims to "", so the join keeps the leading '/'
    let mut segments: Vec<&str> = Vec::with_capacity(3);
    if !parts.directory.is_empty() {
        segments.push(parts.directory.trim_end_matches('/'));
    }
    if identifier.is_some() && !config.dirname.is_empty() {
        segments.push(config.dirname.trim_matches('/'));
    }
    segments.push(&file_name);
    Ok(segments.join("/"))
}
