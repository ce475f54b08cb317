//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orientation tag** | `image::ImageReader`, `ImageDecoder::orientation` |
//! | **Crop / resize** | `crop_imm` + `resize_exact` (Lanczos3) |
//! | **Sharpen / detail** | `filter3x3` with the classic 3x3 kernels |
//! | **Encode** | `JpegEncoder` with quality, codec defaults otherwise |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop/resize geometry (unit testable)
//! - **Orientation**: Tag → rotation mapping and the normalization step
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Decoded, ImageBackend};
pub use calculations::{
    CropRect, Dimensions, Geometry, TargetSize, center_crop, compute_crop_and_resize,
};
pub use orientation::{Rotation, normalize_orientation, rotation_for_tag};
pub use params::{Filter, Format, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
