//! Camera orientation correction.
//!
//! Only the three pure rotations are honoured:
//!
//! | EXIF tag | Correction |
//! |---|---|
//! | 3 | 180° |
//! | 6 | 90° clockwise |
//! | 8 | 270° clockwise (90° counter-clockwise) |
//!
//! Mirrored orientations (2, 4, 5, 7), tag 1, a missing tag and unreadable
//! metadata all mean "leave the image as decoded". That fallback is a normal
//! branch, not an error: normalization never fails.

use super::backend::ImageBackend;
use tracing::debug;

/// Clockwise rotation applied to correct the capture orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Whether the rotation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

/// Map an embedded orientation tag to the rotation that corrects it.
pub fn rotation_for_tag(tag: Option<u16>) -> Option<Rotation> {
    match tag {
        Some(3) => Some(Rotation::Rotate180),
        Some(6) => Some(Rotation::Rotate90),
        Some(8) => Some(Rotation::Rotate270),
        // No tag, identity, mirrored variants or garbage: keep as decoded
        _ => None,
    }
}

/// Rotate `image` upright according to `tag`. The canvas always expands to
/// fit, so a 90° turn swaps the dimensions.
pub fn normalize_orientation<B: ImageBackend>(
    backend: &B,
    image: B::Image,
    tag: Option<u16>,
) -> B::Image {
    match rotation_for_tag(tag) {
        Some(rotation) => {
            debug!(?tag, ?rotation, "correcting orientation");
            backend.rotate(image, rotation)
        }
        None => image,
    }
}
