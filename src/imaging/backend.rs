//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the codec capability the pipeline calls:
//! decode (with the embedded orientation tag), a handful of pixel primitives,
//! and encode. The pipeline owns the *decisions* (which crop, which filters,
//! in which order); the backend only executes them.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on
//! the `image` crate.

use super::calculations::{CropRect, Dimensions};
use super::orientation::Rotation;
use super::params::{Filter, Format, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Encode(String),
}

/// A freshly decoded image plus what the container told us about it.
#[derive(Debug)]
pub struct Decoded<I> {
    pub image: I,
    /// Format the bytes were encoded in.
    pub format: Format,
    /// Embedded orientation tag, `None` when absent or unreadable.
    pub orientation: Option<u16>,
}

/// Trait for image codec backends.
///
/// Pixel operations take the image by value and return the result, so a
/// backend is free to reuse buffers. None of them can fail: the pipeline only
/// requests crops inside the image bounds and non-zero sizes.
pub trait ImageBackend: Sync {
    type Image;

    /// Decode raw bytes, guessing the format from content.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Self::Image>, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Convert anything other than grayscale, RGB or RGBA to RGB.
    fn normalize_color(&self, image: Self::Image) -> Self::Image;

    /// Rotate clockwise, expanding the canvas to fit.
    fn rotate(&self, image: Self::Image, rotation: Rotation) -> Self::Image;

    fn crop(&self, image: Self::Image, rect: CropRect) -> Self::Image;

    /// Resize to exactly `size` with an anti-aliased (Lanczos3) filter.
    fn resize(&self, image: Self::Image, size: Dimensions) -> Self::Image;

    fn filter(&self, image: Self::Image, filter: Filter) -> Self::Image;

    /// Encode into `format`. `quality` applies to JPEG only.
    fn encode(
        &self,
        image: &Self::Image,
        format: &Format,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
