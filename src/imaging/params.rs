//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`process`](crate::process) pipeline (which decides
//! what to produce) and the [`backend`](super::backend) (which does the actual
//! pixel work). This separation allows swapping backends (e.g. for testing
//! with a mock) without changing pipeline logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`Filter`]: the two post-resize filters, with their convolution kernels.
//! - [`Format`]: output encoding name (`JPEG`, `PNG`, …) and its file extension.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Post-resize enhancement filters, applied in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Sharpen,
    Detail,
}

impl Filter {
    /// 3x3 convolution kernel, row-major, normalized to sum to 1.
    pub fn kernel(self) -> [f32; 9] {
        match self {
            Filter::Sharpen => [
                -2.0 / 16.0,
                -2.0 / 16.0,
                -2.0 / 16.0,
                -2.0 / 16.0,
                32.0 / 16.0,
                -2.0 / 16.0,
                -2.0 / 16.0,
                -2.0 / 16.0,
                -2.0 / 16.0,
            ],
            Filter::Detail => [
                0.0,
                -1.0 / 6.0,
                0.0,
                -1.0 / 6.0,
                10.0 / 6.0,
                -1.0 / 6.0,
                0.0,
                -1.0 / 6.0,
                0.0,
            ],
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Sharpen => f.write_str("sharpen"),
            Filter::Detail => f.write_str("detail"),
        }
    }
}

/// Name of an encoding format, normalized to upper case (`"JPEG"`, `"PNG"`).
///
/// Any name can be represented; whether it can actually be encoded is up to
/// the backend, which reports `UnsupportedFormat` otherwise. This keeps
/// path naming (which only needs the extension) independent of the codecs
/// compiled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Format(String);

impl Format {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(
            name.as_ref()
                .trim()
                .trim_start_matches('.')
                .to_ascii_uppercase(),
        )
    }

    pub fn jpeg() -> Self {
        Self::new("JPEG")
    }

    pub fn png() -> Self {
        Self::new("PNG")
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self.0.as_str(), "JPEG" | "JPG")
    }

    /// File extension for this format, including the leading dot.
    ///
    /// `JPEG` maps to `.jpg`; every other format is its lower-cased name.
    pub fn extension(&self) -> String {
        if self.0 == "JPEG" {
            ".jpg".to_string()
        } else {
            format!(".{}", self.0.to_ascii_lowercase())
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::jpeg()
    }
}

impl From<String> for Format {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Format {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.0
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
