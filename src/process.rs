//! The per-image processing pipeline and the thumbnail set built on it.
//!
//! ## Pipeline
//!
//! [`Pipeline::process`] turns encoded bytes into an [`EncodedImage`]:
//!
//! ```text
//! decode → normalize colour → correct orientation → crop/resize → sharpen → detail → encode
//! ```
//!
//! Without options only the first two steps run and the image is re-encoded
//! in the format it was decoded from.
//!
//! ## Thumbnail sets
//!
//! A [`ThumbnailSet`] pairs the optional source options with named variants
//! and knows where each output lives:
//!
//! ```text
//! images/photo.jpg               ← source (processed or stored as-is)
//! images/thumbs/photo.small.jpg  ← variant "small"
//! images/thumbs/photo.large.png  ← variant "large"
//! ```
//!
//! Variants always render from the original source bytes and are independent
//! of each other: one failing variant is reported without stopping the rest.
//!
//! ## Parallel Processing
//!
//! Variants of one source are rendered in parallel using
//! [rayon](https://docs.rs/rayon). The pool size is set by the binary from
//! `[processing] max_processes`.

use crate::config::ThumbnailsConfig;
use crate::error::{Result, ThumbnailError};
use crate::imaging::{
    Dimensions, Format, Geometry, ImageBackend, Quality, compute_crop_and_resize,
    normalize_orientation,
};
use crate::naming::resolve_path;
use crate::options::{ProcessingOptions, VariantSpec};
use crate::storage::{Storage, read_source};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use tracing::{debug, info, warn};

/// Encoded output of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    format: Format,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, format: Format) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// File extension matching the encoded format, with the leading dot.
    pub fn extension(&self) -> String {
        self.format.extension()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Runs the processing steps through an image backend.
pub struct Pipeline<'a, B: ImageBackend> {
    backend: &'a B,
    config: &'a ThumbnailsConfig,
}

impl<'a, B: ImageBackend> Pipeline<'a, B> {
    pub fn new(backend: &'a B, config: &'a ThumbnailsConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ThumbnailsConfig {
        self.config
    }

    /// Geometry the pipeline would apply to an upright image of `original`
    /// size. `None` when the options request no resize.
    pub fn plan(
        &self,
        original: Dimensions,
        options: &ProcessingOptions,
    ) -> Result<Option<Geometry>> {
        options
            .size
            .map(|target| compute_crop_and_resize(original, target, options.upscale))
            .transpose()
    }

    /// Decode `bytes`, apply `options`, and encode the result.
    pub fn process(
        &self,
        bytes: &[u8],
        options: Option<&ProcessingOptions>,
    ) -> Result<EncodedImage> {
        let backend = self.backend;
        let quality = Quality::new(self.config.quality);

        let decoded = backend.decode(bytes)?;
        let image = backend.normalize_color(decoded.image);

        let Some(options) = options else {
            let encoded = backend.encode(&image, &decoded.format, quality)?;
            return Ok(EncodedImage::new(encoded, decoded.format));
        };

        let mut image = normalize_orientation(backend, image, decoded.orientation);

        let original = backend.dimensions(&image);
        match self.plan(original, options)? {
            Some(Geometry::Transform { crop, size }) => {
                debug!(?original, ?crop, ?size, "applying geometry");
                if let Some(rect) = crop.filter(|rect| !rect.is_full_frame(original)) {
                    image = backend.crop(image, rect);
                }
                if backend.dimensions(&image) != size {
                    image = backend.resize(image, size);
                }
            }
            Some(Geometry::Unchanged) => {
                debug!(?original, "target exceeds original, keeping size");
            }
            None => {}
        }

        for filter in options.filters() {
            image = backend.filter(image, filter);
        }

        let encoded = backend.encode(&image, &options.format, quality)?;
        Ok(EncodedImage::new(encoded, options.format.clone()))
    }
}

/// Resolved output names for a source and each of its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub source: String,
    pub variants: BTreeMap<String, String>,
}

/// Outcome of [`ThumbnailSet::save`] for a single source image.
#[derive(Debug, Serialize)]
pub struct SaveReport {
    pub name: String,
    /// Where the source was written.
    pub source: String,
    /// Whether the source went through the pipeline or was copied as-is.
    pub source_processed: bool,
    pub variants: Vec<VariantReport>,
}

impl SaveReport {
    pub fn failures(&self) -> usize {
        self.variants.iter().filter(|v| v.error.is_some()).count()
    }
}

#[derive(Debug, Serialize)]
pub struct VariantReport {
    pub identifier: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Source options plus the named variants derived from every source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailSet {
    source: Option<ProcessingOptions>,
    variants: BTreeMap<String, VariantSpec>,
}

impl ThumbnailSet {
    /// `source = None` stores sources unprocessed.
    pub fn new(source: Option<ProcessingOptions>) -> Self {
        Self {
            source,
            variants: BTreeMap::new(),
        }
    }

    /// Add a variant, replacing any with the same identifier.
    pub fn with_variant(mut self, spec: VariantSpec) -> Self {
        self.variants.insert(spec.identifier().to_string(), spec);
        self
    }

    pub fn source_options(&self) -> Option<&ProcessingOptions> {
        self.source.as_ref()
    }

    /// Variants in identifier order.
    pub fn variants(&self) -> impl Iterator<Item = &VariantSpec> {
        self.variants.values()
    }

    pub fn variant(&self, identifier: &str) -> Option<&VariantSpec> {
        self.variants.get(identifier)
    }

    /// Output names for `name` and its variants, without touching pixels.
    pub fn paths(&self, name: &str, config: &ThumbnailsConfig) -> Result<OutputPaths> {
        let source = resolve_path(name, None, self.source.as_ref(), None, config)?;
        let variants = self
            .variants()
            .map(|spec| {
                let path = variant_path(name, spec, config)?;
                Ok((spec.identifier().to_string(), path))
            })
            .collect::<Result<_>>()?;
        Ok(OutputPaths { source, variants })
    }

    /// Render every variant from `bytes` in parallel, in identifier order.
    pub fn render_all<B: ImageBackend>(
        &self,
        pipeline: &Pipeline<'_, B>,
        bytes: &[u8],
    ) -> Vec<(String, Result<EncodedImage>)> {
        self.variants
            .par_iter()
            .map(|(identifier, spec)| {
                let result = pipeline.process(bytes, Some(spec.options()));
                (identifier.clone(), result)
            })
            .collect()
    }

    /// Read `name` from `input`, then write the source and all variants to
    /// `output` at their resolved names.
    ///
    /// Reading or processing the source is fatal. Variant failures are
    /// logged and recorded in the report.
    pub fn save<B, I, O>(
        &self,
        pipeline: &Pipeline<'_, B>,
        input: &I,
        output: &O,
        name: &str,
    ) -> Result<SaveReport>
    where
        B: ImageBackend,
        I: Storage + ?Sized,
        O: Storage + ?Sized,
    {
        let config = pipeline.config();
        let bytes = read_source(input, name)?;

        let source_path = resolve_path(name, None, self.source.as_ref(), None, config)?;
        match &self.source {
            Some(options) => {
                let encoded = pipeline.process(&bytes, Some(options))?;
                write(output, &source_path, encoded.bytes())?;
            }
            None => write(output, &source_path, &bytes)?,
        }
        info!(image = name, path = %source_path, "saved source");

        let mut variants = Vec::with_capacity(self.variants.len());
        for (identifier, result) in self.render_all(pipeline, &bytes) {
            let Some(spec) = self.variants.get(&identifier) else {
                continue;
            };
            let path = variant_path(name, spec, config)?;
            let outcome = result.and_then(|encoded| write(output, &path, encoded.bytes()));
            let error = match outcome {
                Ok(()) => {
                    info!(image = name, variant = %identifier, %path, "saved variant");
                    None
                }
                Err(e) => {
                    warn!(image = name, variant = %identifier, error = %e, "variant failed");
                    Some(e.to_string())
                }
            };
            variants.push(VariantReport {
                identifier,
                path,
                error,
            });
        }

        Ok(SaveReport {
            name: name.to_string(),
            source: source_path,
            source_processed: self.source.is_some(),
            variants,
        })
    }

    /// Delete the stored source and every variant of `name`. Missing files
    /// are skipped. Returns the names that were actually removed.
    pub fn delete<S: Storage + ?Sized>(
        &self,
        storage: &S,
        name: &str,
        config: &ThumbnailsConfig,
    ) -> Result<Vec<String>> {
        let paths = self.paths(name, config)?;
        let mut deleted = Vec::new();
        for path in std::iter::once(paths.source).chain(paths.variants.into_values()) {
            match storage.delete(&path) {
                Ok(()) => {
                    debug!(%path, "deleted");
                    deleted.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(ThumbnailError::storage(&path, e)),
            }
        }
        Ok(deleted)
    }
}

fn variant_path(name: &str, spec: &VariantSpec, config: &ThumbnailsConfig) -> Result<String> {
    resolve_path(
        name,
        Some(spec.identifier()),
        Some(spec.options()),
        None,
        config,
    )
}

fn write<S: Storage + ?Sized>(storage: &S, path: &str, bytes: &[u8]) -> Result<()> {
    storage
        .save(path, bytes)
        .map_err(|e| ThumbnailError::storage(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, MockImage, RecordedOp};
    use crate::imaging::{CropRect, Filter, Rotation, TargetSize};
    use crate::storage::tests::MemoryStorage;

    fn jpeg_options() -> ProcessingOptions {
        ProcessingOptions::new(Format::jpeg())
    }

    fn sized(width: u32, height: u32) -> ProcessingOptions {
        jpeg_options().with_size(TargetSize::exact(width, height))
    }

    fn encode_op(format: &str) -> RecordedOp {
        RecordedOp::Encode {
            format: format.into(),
            quality: 85,
        }
    }

    fn variant(identifier: &str, options: ProcessingOptions) -> VariantSpec {
        VariantSpec::new(identifier, options).unwrap()
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    #[test]
    fn crop_then_resize_to_square() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let encoded = pipeline.process(b"img", Some(&sized(200, 200))).unwrap();

        assert_eq!(encoded.bytes(), b"JPEG 200x200");
        assert_eq!(encoded.extension(), ".jpg");
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::NormalizeColor,
                RecordedOp::Crop(CropRect::new(250, 0, 750, 500)),
                RecordedOp::Resize(Dimensions::new(200, 200)),
                encode_op("JPEG"),
            ]
        );
    }

    #[test]
    fn no_options_reencodes_in_decoded_format() {
        let backend = MockBackend::with_image(MockImage::new(640, 480), Format::png(), Some(6));
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let encoded = pipeline.process(b"img", None).unwrap();

        assert_eq!(encoded.format(), &Format::png());
        // No orientation step without options
        assert_eq!(encoded.bytes(), b"PNG 640x480");
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::NormalizeColor,
                encode_op("PNG")
            ]
        );
    }

    #[test]
    fn orientation_corrected_before_geometry() {
        let backend = MockBackend::with_image(MockImage::new(400, 300), Format::jpeg(), Some(6));
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let options = jpeg_options().with_size(TargetSize::new(Some(150), None));
        let encoded = pipeline.process(b"img", Some(&options)).unwrap();

        // Upright image is 300x400, so a 150 width derives a 200 height
        assert_eq!(encoded.bytes(), b"JPEG 150x200");
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::NormalizeColor,
                RecordedOp::Rotate(Rotation::Rotate90),
                RecordedOp::Resize(Dimensions::new(150, 200)),
                encode_op("JPEG"),
            ]
        );
    }

    #[test]
    fn unchanged_geometry_skips_to_filters() {
        let backend = MockBackend::with_image(MockImage::new(100, 80), Format::jpeg(), None);
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let mut options = sized(300, 300);
        options.sharpen = true;
        options.detail = true;
        let encoded = pipeline.process(b"img", Some(&options)).unwrap();

        assert_eq!(encoded.bytes(), b"JPEG 100x80");
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::NormalizeColor,
                RecordedOp::Filter(Filter::Sharpen),
                RecordedOp::Filter(Filter::Detail),
                encode_op("JPEG"),
            ]
        );
    }

    #[test]
    fn upscale_allows_enlarging() {
        let backend = MockBackend::with_image(MockImage::new(100, 100), Format::jpeg(), None);
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let mut options = sized(300, 300);
        options.upscale = true;
        let encoded = pipeline.process(b"img", Some(&options)).unwrap();

        assert_eq!(encoded.bytes(), b"JPEG 300x300");
        let ops = backend.get_operations();
        // Same aspect ratio: the full-frame crop is skipped
        assert!(!ops.iter().any(|op| matches!(op, RecordedOp::Crop(_))));
        assert!(ops.contains(&RecordedOp::Resize(Dimensions::new(300, 300))));
    }

    #[test]
    fn matching_size_skips_resize() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        pipeline.process(b"img", Some(&sized(1000, 500))).unwrap();

        let ops = backend.get_operations();
        assert!(
            !ops.iter()
                .any(|op| matches!(op, RecordedOp::Crop(_) | RecordedOp::Resize(_)))
        );
    }

    #[test]
    fn configured_quality_reaches_encoder() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig {
            quality: 60,
            ..ThumbnailsConfig::default()
        };
        let pipeline = Pipeline::new(&backend, &config);

        pipeline.process(b"img", Some(&jpeg_options())).unwrap();

        assert_eq!(
            backend.get_operations().last(),
            Some(&RecordedOp::Encode {
                format: "JPEG".into(),
                quality: 60
            })
        );
    }

    #[test]
    fn decode_failure_is_reported() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let err = pipeline.process(b"", Some(&jpeg_options())).unwrap_err();
        assert!(matches!(err, ThumbnailError::Decode(_)));
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let options = ProcessingOptions::new(Format::new("xyz"));
        let err = pipeline.process(b"img", Some(&options)).unwrap_err();
        assert!(matches!(err, ThumbnailError::UnsupportedFormat(f) if f == "XYZ"));
    }

    #[test]
    fn plan_without_size_is_none() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let plan = pipeline
            .plan(Dimensions::new(10, 10), &jpeg_options())
            .unwrap();
        assert_eq!(plan, None);
    }

    #[test]
    fn processing_is_deterministic() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);
        let options = sized(120, 90);

        let a = pipeline.process(b"img", Some(&options)).unwrap();
        let b = pipeline.process(b"img", Some(&options)).unwrap();
        assert_eq!(a, b);
    }

    // =========================================================================
    // ThumbnailSet
    // =========================================================================

    fn sample_set() -> ThumbnailSet {
        let large = ProcessingOptions::new(Format::png()).with_size(TargetSize::exact(800, 400));
        ThumbnailSet::new(Some(jpeg_options().with_size(TargetSize::new(Some(500), None))))
            .with_variant(variant("small", sized(200, 200)))
            .with_variant(variant("large", large))
    }

    #[test]
    fn paths_cover_source_and_variants() {
        let config = ThumbnailsConfig::default();
        let paths = sample_set().paths("images/photo.jpeg", &config).unwrap();

        assert_eq!(paths.source, "images/photo.jpg");
        assert_eq!(paths.variants["small"], "images/thumbs/photo.small.jpg");
        assert_eq!(paths.variants["large"], "images/thumbs/photo.large.png");
    }

    #[test]
    fn render_all_follows_identifier_order() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);

        let results = sample_set().render_all(&pipeline, b"img");
        let identifiers: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(identifiers, vec!["large", "small"]);
        assert_eq!(results[0].1.as_ref().unwrap().bytes(), b"PNG 800x400");
        assert_eq!(results[1].1.as_ref().unwrap().bytes(), b"JPEG 200x200");
    }

    #[test]
    fn save_writes_source_and_variants() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);
        let input = MemoryStorage::new().with_file("images/photo.jpg", b"img");
        let output = MemoryStorage::new();

        let report = sample_set()
            .save(&pipeline, &input, &output, "images/photo.jpg")
            .unwrap();

        assert!(report.source_processed);
        assert_eq!(report.failures(), 0);
        assert_eq!(output.get("images/photo.jpg").unwrap(), b"JPEG 500x250");
        assert_eq!(
            output.get("images/thumbs/photo.small.jpg").unwrap(),
            b"JPEG 200x200"
        );
        assert_eq!(
            output.get("images/thumbs/photo.large.png").unwrap(),
            b"PNG 800x400"
        );
    }

    #[test]
    fn save_without_source_options_stores_bytes_verbatim() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);
        let storage = MemoryStorage::new().with_file("photo.gif", b"original");

        let set = ThumbnailSet::new(None).with_variant(variant("small", sized(20, 20)));
        let report = set.save(&pipeline, &storage, &storage, "photo.gif").unwrap();

        assert!(!report.source_processed);
        assert_eq!(report.source, "photo.gif");
        assert_eq!(storage.get("photo.gif").unwrap(), b"original");
        assert_eq!(storage.get("thumbs/photo.small.jpg").unwrap(), b"JPEG 20x20");
    }

    #[test]
    fn failing_variant_does_not_stop_others() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);
        let storage = MemoryStorage::new().with_file("a.jpg", b"img");

        let set = ThumbnailSet::new(None)
            .with_variant(variant("bad", ProcessingOptions::new(Format::new("xyz"))))
            .with_variant(variant("good", sized(10, 10)));
        let report = set.save(&pipeline, &storage, &storage, "a.jpg").unwrap();

        assert_eq!(report.failures(), 1);
        let bad = &report.variants[0];
        assert_eq!(bad.identifier, "bad");
        assert!(bad.error.as_deref().unwrap().contains("XYZ"));
        assert!(!storage.exists("thumbs/a.bad.xyz"));
        assert!(storage.exists("thumbs/a.good.jpg"));
    }

    #[test]
    fn save_missing_source_is_storage_error() {
        let backend = MockBackend::new();
        let config = ThumbnailsConfig::default();
        let pipeline = Pipeline::new(&backend, &config);
        let storage = MemoryStorage::new();

        let err = sample_set()
            .save(&pipeline, &storage, &storage, "missing.jpg")
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::StorageAccess { .. }));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn delete_removes_existing_outputs_only() {
        let config = ThumbnailsConfig::default();
        let storage = MemoryStorage::new()
            .with_file("images/photo.jpg", b"a")
            .with_file("images/thumbs/photo.small.jpg", b"b")
            .with_file("images/other.jpg", b"c");

        let deleted = sample_set()
            .delete(&storage, "images/photo.jpg", &config)
            .unwrap();

        assert_eq!(
            deleted,
            vec!["images/photo.jpg", "images/thumbs/photo.small.jpg"]
        );
        assert_eq!(storage.names(), vec!["images/other.jpg"]);
    }
}
