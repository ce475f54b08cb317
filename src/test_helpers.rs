//! Shared test utilities: synthetic images generated in memory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = encode_test_image(&gradient_image(64, 48), ImageFormat::Png);
//! let decoded = RustBackend::new().decode(&png).unwrap();
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// RGB image with a horizontal red ramp and a vertical green ramp, so
/// crops and rotations produce visibly different pixels.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    })
}

/// Encode `image` in `format` and return the bytes.
pub fn encode_test_image(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}
