//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each source image leads with its positional index and name; where its
//! outputs went is shown as indented context, one line per variant:
//!
//! ```text
//! 001 images/photo.jpg
//!     source: images/photo.jpg (processed)
//!     large: images/thumbs/photo.large.png
//!     small: FAILED Unsupported image format: XYZ
//!
//! Processed 1 image, 1 variant failed
//! ```
//!
//! `paths` and `check` use the same two-level layout:
//!
//! ```text
//! images/photo.jpg
//!     source: images/photo.jpg
//!     small: images/thumbs/photo.small.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ThumbnailsConfig;
use crate::options::ProcessingOptions;
use crate::process::{OutputPaths, SaveReport, ThumbnailSet};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// One-line summary of processing options: `200x200 sharpen → JPEG`.
fn options_summary(options: &ProcessingOptions) -> String {
    let mut parts = Vec::new();
    if let Some(size) = options.size {
        parts.push(size.to_string());
    }
    parts.extend(options.filters().map(|f| f.to_string()));
    if options.upscale {
        parts.push("upscale".to_string());
    }
    parts.push(format!("→ {}", options.format));
    parts.join(" ")
}

// ============================================================================
// process
// ============================================================================

/// Format the result of saving one source image.
pub fn format_save_report(index: usize, report: &SaveReport) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), report.name)];
    let state = if report.source_processed {
        "processed"
    } else {
        "stored"
    };
    lines.push(format!("{}source: {} ({})", indent(1), report.source, state));
    for variant in &report.variants {
        match &variant.error {
            None => lines.push(format!(
                "{}{}: {}",
                indent(1),
                variant.identifier,
                variant.path
            )),
            Some(error) => lines.push(format!(
                "{}{}: FAILED {}",
                indent(1),
                variant.identifier,
                error
            )),
        }
    }
    lines
}

pub fn print_save_report(index: usize, report: &SaveReport) {
    for line in format_save_report(index, report) {
        println!("{}", line);
    }
}

/// Format an error for a source image that could not be processed at all.
pub fn format_image_error(index: usize, name: &str, error: &dyn std::fmt::Display) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), name),
        format!("{}FAILED {}", indent(1), error),
    ]
}

pub fn print_image_error(index: usize, name: &str, error: &dyn std::fmt::Display) {
    for line in format_image_error(index, name, error) {
        println!("{}", line);
    }
}

/// Closing line of a `process` run.
pub fn format_batch_summary(images: usize, failed_images: usize, failed_variants: usize) -> String {
    let mut summary = format!("Processed {}", plural(images, "image"));
    if failed_images > 0 {
        summary.push_str(&format!(", {} failed", plural(failed_images, "image")));
    }
    if failed_variants > 0 {
        summary.push_str(&format!(", {} failed", plural(failed_variants, "variant")));
    }
    summary
}

// ============================================================================
// paths
// ============================================================================

/// Format resolved output paths for one source name.
pub fn format_paths(name: &str, paths: &OutputPaths) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    lines.push(format!("{}source: {}", indent(1), paths.source));
    for (identifier, path) in &paths.variants {
        lines.push(format!("{}{}: {}", indent(1), identifier, path));
    }
    lines
}

pub fn print_paths(name: &str, paths: &OutputPaths) {
    for line in format_paths(name, paths) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format a validated configuration: settings, then source and variants.
pub fn format_config_summary(config: &ThumbnailsConfig, set: &ThumbnailSet) -> Vec<String> {
    let dirname = if config.dirname.is_empty() {
        "(next to source)"
    } else {
        config.dirname.as_str()
    };
    let mut lines = vec![
        "Thumbnails".to_string(),
        format!("{}format: {}", indent(1), config.format),
        format!("{}quality: {}", indent(1), config.quality),
        format!("{}dirname: {}", indent(1), dirname),
        "Source".to_string(),
    ];
    match set.source_options() {
        Some(options) => lines.push(format!("{}{}", indent(1), options_summary(options))),
        None => lines.push(format!("{}stored unprocessed", indent(1))),
    }
    lines.push(format!("Variants ({})", set.variants().count()));
    for spec in set.variants() {
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            spec.identifier(),
            options_summary(spec.options())
        ));
    }
    lines
}

pub fn print_config_summary(config: &ThumbnailsConfig, set: &ThumbnailSet) {
    for line in format_config_summary(config, set) {
        println!("{}", line);
    }
}
