//! Pure calculation functions for crop-and-resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Aspect-fill
//!
//! When both target dimensions are given, the longer side of the original
//! (relative to the target aspect ratio) is trimmed symmetrically so the
//! remaining frame has the target aspect ratio, then scaled:
//!
//! ```text
//! 1000x500 → 200x200
//! ┌────┬──────────┬────┐
//! │    │          │    │   crop (250, 0, 750, 500)
//! │trim│   kept   │trim│   then resize 500x500 → 200x200
//! │    │          │    │
//! └────┴──────────┴────┘
//! ```
//!
//! When only one dimension is given the other is derived from the original
//! aspect ratio and nothing is cropped.

use crate::error::{Result, ThumbnailError};
use serde::Serialize;

/// Concrete pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A requested output size. A missing (or zero) component is derived from
/// the original aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TargetSize {
    width: Option<u32>,
    height: Option<u32>,
}

impl TargetSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width: width.filter(|&w| w > 0),
            height: height.filter(|&h| h > 0),
        }
    }

    /// Both dimensions set: the output is cropped to this exact frame.
    pub fn exact(width: u32, height: u32) -> Self {
        Self::new(Some(width), Some(height))
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn is_unspecified(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

impl std::fmt::Display for TargetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}x{}", side(self.width), side(self.height))
    }
}

/// Crop box in original image coordinates. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The whole frame of an image with the given dimensions.
    pub fn full(dims: Dimensions) -> Self {
        Self::new(0, 0, dims.width, dims.height)
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn is_full_frame(&self, dims: Dimensions) -> bool {
        *self == Self::full(dims)
    }
}

/// Outcome of the geometry engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// The target is larger than the original in both dimensions and
    /// upscaling is not allowed: leave the pixels alone.
    Unchanged,
    /// Optionally crop, then resize to `size`.
    Transform {
        crop: Option<CropRect>,
        size: Dimensions,
    },
}

/// Compute the crop rectangle and final size for an aspect-fill resize.
///
/// # Arguments
/// * `original` - Dimensions of the (orientation-corrected) source image
/// * `target` - Requested size; at least one component must be set
/// * `upscale` - Whether the image may be enlarged beyond its original size
///
/// # Errors
/// [`ThumbnailError::InvalidArgument`] when neither target dimension is set
/// or the original has no pixels.
///
/// # Examples
/// ```
/// # use thumbworks::imaging::{compute_crop_and_resize, CropRect, Dimensions, Geometry, TargetSize};
/// let geometry = compute_crop_and_resize(
///     Dimensions::new(1000, 500),
///     TargetSize::exact(200, 200),
///     false,
/// )
/// .unwrap();
/// assert_eq!(
///     geometry,
///     Geometry::Transform {
///         crop: Some(CropRect::new(250, 0, 750, 500)),
///         size: Dimensions::new(200, 200),
///     }
/// );
/// ```
pub fn compute_crop_and_resize(
    original: Dimensions,
    target: TargetSize,
    upscale: bool,
) -> Result<Geometry> {
    let Dimensions {
        width: w,
        height: h,
    } = original;
    if w == 0 || h == 0 {
        return Err(ThumbnailError::InvalidArgument(format!(
            "original image has no pixels ({w}x{h})"
        )));
    }

    let (size, crop) = match (target.width(), target.height()) {
        (None, None) => {
            return Err(ThumbnailError::InvalidArgument(
                "Must provide a width or a height".into(),
            ));
        }
        (Some(tw), None) => (Dimensions::new(tw, derive_missing(h, tw, w)), false),
        (None, Some(th)) => (Dimensions::new(derive_missing(w, th, h), th), false),
        (Some(tw), Some(th)) => (Dimensions::new(tw, th), true),
    };

    // Enlarging in only one dimension is allowed; both means upscaling.
    if size.width > w && size.height > h && !upscale {
        return Ok(Geometry::Unchanged);
    }

    Ok(Geometry::Transform {
        crop: crop.then(|| center_crop(original, size)),
        size,
    })
}

/// `floor(other * given / original_given)`, never below one pixel.
fn derive_missing(original_other: u32, given: u32, original_given: u32) -> u32 {
    let derived = original_other as u64 * given as u64 / original_given as u64;
    u32::try_from(derived).unwrap_or(u32::MAX).max(1)
}

/// Centered crop that gives `original` the aspect ratio of `target`.
///
/// Ratios are compared by cross-multiplication so equal ratios are never
/// misclassified by floating point error. Offsets are the floor of half the
/// excess, exactly as `floor(0.5 * (w - At * h))` would be in real numbers.
pub fn center_crop(original: Dimensions, target: Dimensions) -> CropRect {
    let (w, h) = (original.width as u64, original.height as u64);
    let (tw, th) = (target.width as u64, target.height as u64);

    let wide = w * th;
    let tall = tw * h;

    if wide > tall {
        // Original relatively wider: trim the width
        let xoffset = ((wide - tall) / (2 * th)) as u32;
        CropRect::new(xoffset, 0, original.width - xoffset, original.height)
    } else if wide < tall {
        // Original relatively taller: trim the height
        let yoffset = ((tall - wide) / (2 * tw)) as u32;
        CropRect::new(0, yoffset, original.width, original.height - yoffset)
    } else {
        CropRect::full(original)
    }
}
