//! Pure Rust codec backend. Every codec is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | Orientation tag | `image::ImageDecoder::orientation` |
//! | Colour normalization | `DynamicImage::to_rgb8` |
//! | Rotate / crop | `DynamicImage::rotate{90,180,270}`, `crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Sharpen / detail | `DynamicImage::filter3x3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with configured quality |
//! | Encode → others | `DynamicImage::write_to` (codec defaults) |

use super::backend::{BackendError, Decoded, ImageBackend};
use super::calculations::{CropRect, Dimensions};
use super::orientation::Rotation;
use super::params::{Filter, Format, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::LazyLock;

/// Format names this backend understands, with their codec.
///
/// The first entry for a codec is its canonical name (`JPEG`, not `JPG`).
/// AVIF is encode-only: the `image` crate's `"avif"` feature ships the rav1e
/// encoder but no decoder.
const FORMATS: &[(&str, ImageFormat)] = &[
    ("JPEG", ImageFormat::Jpeg),
    ("JPG", ImageFormat::Jpeg),
    ("PNG", ImageFormat::Png),
    ("GIF", ImageFormat::Gif),
    ("BMP", ImageFormat::Bmp),
    ("TIFF", ImageFormat::Tiff),
    ("TIF", ImageFormat::Tiff),
    ("WEBP", ImageFormat::WebP),
    ("AVIF", ImageFormat::Avif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<String>> = LazyLock::new(|| {
    FORMATS
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && *fmt != ImageFormat::Avif)
        .map(|(name, _)| name.to_ascii_lowercase())
        .collect()
});

/// Returns the image file extensions (without dot) that can be decoded.
pub fn supported_input_extensions() -> &'static [String] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_for(format: &Format) -> Option<ImageFormat> {
    FORMATS
        .iter()
        .find(|(name, _)| *name == format.name())
        .map(|(_, fmt)| *fmt)
        .filter(|fmt| fmt.writing_enabled())
}

fn format_name(codec: ImageFormat) -> Format {
    FORMATS
        .iter()
        .find(|(_, fmt)| *fmt == codec)
        .map(|(name, _)| Format::new(name))
        .unwrap_or_else(|| Format::new(codec.extensions_str().first().copied().unwrap_or("")))
}

/// EXIF tag number for a decoder-reported orientation.
///
/// `NoTransforms` is reported both for tag 1 and for "no metadata", so it
/// maps to `None`.
#[allow(unreachable_patterns)]
fn exif_tag(orientation: Orientation) -> Option<u16> {
    match orientation {
        Orientation::NoTransforms => None,
        Orientation::FlipHorizontal => Some(2),
        Orientation::Rotate180 => Some(3),
        Orientation::FlipVertical => Some(4),
        Orientation::Rotate90FlipH => Some(5),
        Orientation::Rotate90 => Some(6),
        Orientation::Rotate270FlipH => Some(7),
        Orientation::Rotate270 => Some(8),
        _ => None,
    }
}

/// Read the orientation tag, treating a metadata failure as "no tag".
fn read_orientation(decoder: &mut impl ImageDecoder) -> Option<u16> {
    match decoder.orientation() {
        Ok(orientation) => exif_tag(orientation),
        Err(_) => None,
    }
}

/// JPEG has no alpha channel and no 16-bit mode: flatten to 8-bit RGB.
fn jpeg_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<DynamicImage>, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let codec = reader
            .format()
            .ok_or_else(|| BackendError::Decode("unrecognized image data".into()))?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let orientation = read_orientation(&mut decoder);
        let image =
            DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(Decoded {
            image,
            format: format_name(codec),
            orientation,
        })
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions::new(image.width(), image.height())
    }

    fn normalize_color(&self, image: DynamicImage) -> DynamicImage {
        match image.color() {
            ColorType::L8 | ColorType::Rgb8 | ColorType::Rgba8 => image,
            _ => DynamicImage::ImageRgb8(image.to_rgb8()),
        }
    }

    fn rotate(&self, image: DynamicImage, rotation: Rotation) -> DynamicImage {
        match rotation {
            Rotation::Rotate90 => image.rotate90(),
            Rotation::Rotate180 => image.rotate180(),
            Rotation::Rotate270 => image.rotate270(),
        }
    }

    fn crop(&self, image: DynamicImage, rect: CropRect) -> DynamicImage {
        image.crop_imm(rect.left, rect.top, rect.width(), rect.height())
    }

    fn resize(&self, image: DynamicImage, size: Dimensions) -> DynamicImage {
        image.resize_exact(size.width, size.height, FilterType::Lanczos3)
    }

    fn filter(&self, image: DynamicImage, filter: Filter) -> DynamicImage {
        image.filter3x3(&filter.kernel())
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: &Format,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let codec =
            codec_for(format).ok_or_else(|| BackendError::UnsupportedFormat(format.to_string()))?;

        let mut buffer = Cursor::new(Vec::new());
        let written = if codec == ImageFormat::Jpeg {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value() as u8);
            jpeg_compatible(image).write_with_encoder(encoder)
        } else {
            image.write_to(&mut buffer, codec)
        };
        written.map_err(|e| BackendError::Encode(format!("{format} encode failed: {e}")))?;

        Ok(buffer.into_inner())
    }
}
