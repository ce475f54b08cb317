//! # thumbworks
//!
//! Named thumbnail variants for raster images: aspect-filling crop/resize,
//! orientation correction, optional sharpen/detail filters, and deterministic
//! output paths.
//!
//! # Architecture
//!
//! Every image goes through the same short pipeline, once for the source
//! itself (optional) and once per variant:
//!
//! ```text
//! storage → decode → colour → orientation → crop/resize → filters → encode → storage
//! ```
//!
//! The decisions (which crop, which size, which path) are pure functions that
//! never touch pixels, so they are unit tested directly. Pixel work goes
//! through the [`imaging::ImageBackend`] trait, which tests replace with a
//! recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry engine, orientation mapping, and the `image`-crate backend |
//! | [`options`] | Validates raw option tables into [`options::ProcessingOptions`] and [`options::VariantSpec`] |
//! | [`naming`] | Resolves storage names for sources and variants |
//! | [`process`] | The [`process::Pipeline`] and [`process::ThumbnailSet`] (render, save, delete) |
//! | [`storage`] | The [`storage::Storage`] trait and the filesystem implementation |
//! | [`config`] | `thumbworks.toml` loading, merging, and validation |
//! | [`error`] | The [`error::ThumbnailError`] taxonomy |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Aspect-Fill, Never Letterbox
//!
//! When both sides of a size are given the image is center-cropped to the
//! target aspect ratio before resizing, so thumbnails always fill their frame.
//! With one side given the other is derived and nothing is cropped. Images
//! smaller than the target in both dimensions are left alone unless
//! `upscale` is set.
//!
//! ## Integer Geometry
//!
//! Crop offsets and derived sizes are computed with integer
//! cross-multiplication. Equal aspect ratios always compare equal, and the
//! same inputs always produce the same rectangle on every platform.
//!
//! ## Storage Names, Not Paths
//!
//! Output locations are `/`-joined names handed to a [`storage::Storage`].
//! The filesystem is one implementation; the naming rules do not depend on
//! the host OS.

pub mod config;
pub mod error;
pub mod imaging;
pub mod naming;
pub mod options;
pub mod output;
pub mod process;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;
