//! Error taxonomy shared by every stage of thumbnail generation.
//!
//! Validation errors surface at the call that detected them; nothing is
//! deferred or retried. The one intentional silent path is orientation
//! lookup, which falls back to "no rotation" (see
//! [`imaging::orientation`](crate::imaging::orientation)).

use crate::imaging::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// Bad or missing size request handed to the geometry engine.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Unknown or malformed processing options, or a variant without options.
    #[error("Invalid thumbnail option: {0}")]
    InvalidOption(String),
    /// Empty or unusable base name.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// The codec accepted the format but failed while writing it.
    #[error("Could not encode image: {0}")]
    Encode(String),
    #[error("Could not access image data: {name}: {source}")]
    StorageAccess {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl ThumbnailError {
    pub(crate) fn storage(name: &str, source: std::io::Error) -> Self {
        Self::StorageAccess {
            name: name.to_string(),
            source,
        }
    }
}

impl From<BackendError> for ThumbnailError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => Self::Decode(msg),
            BackendError::UnsupportedFormat(format) => Self::UnsupportedFormat(format),
            BackendError::Encode(msg) => Self::Encode(msg),
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ThumbnailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_onto_taxonomy() {
        let err: ThumbnailError = BackendError::Decode("truncated".into()).into();
        assert!(matches!(err, ThumbnailError::Decode(m) if m == "truncated"));

        let err: ThumbnailError = BackendError::UnsupportedFormat("XYZ".into()).into();
        assert!(matches!(err, ThumbnailError::UnsupportedFormat(f) if f == "XYZ"));
    }

    #[test]
    fn storage_error_names_the_resource() {
        let err = ThumbnailError::storage(
            "images/photo.jpg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("images/photo.jpg"), "{msg}");
        assert!(msg.contains("no such file"), "{msg}");
    }
}
