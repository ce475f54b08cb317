//! Processing options for the source image and its variants.
//!
//! Options arrive as a raw TOML table (from `thumbworks.toml` or a caller) and
//! are validated into a [`ProcessingOptions`] record:
//!
//! ```toml
//! size = "200x200"   # "WxH", "200x", "x150", or [200, 150]; 0 = derive
//! sharpen = true
//! detail = false
//! upscale = false
//! format = "PNG"     # defaults to the configured thumbnail format
//! ```
//!
//! Unknown keys are rejected so typos fail loudly instead of being ignored.

use crate::error::{Result, ThumbnailError};
use crate::imaging::{Filter, Format, TargetSize};

/// Every option name a processing table may contain.
pub const OPTION_NAMES: [&str; 5] = ["size", "sharpen", "detail", "upscale", "format"];

/// Validated processing options with every field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOptions {
    /// Crop/resize target; `None` keeps the original geometry.
    pub size: Option<TargetSize>,
    pub sharpen: bool,
    pub detail: bool,
    /// Allow enlarging images smaller than `size`.
    pub upscale: bool,
    pub format: Format,
}

impl ProcessingOptions {
    /// Defaults: no resize, no filters, no upscaling.
    pub fn new(format: Format) -> Self {
        Self {
            size: None,
            sharpen: false,
            detail: false,
            upscale: false,
            format,
        }
    }

    pub fn with_size(mut self, size: TargetSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Filters to apply, in order: sharpen before detail.
    pub fn filters(&self) -> impl Iterator<Item = Filter> + '_ {
        [(self.sharpen, Filter::Sharpen), (self.detail, Filter::Detail)]
            .into_iter()
            .filter_map(|(enabled, filter)| enabled.then_some(filter))
    }
}

/// Validate raw options.
///
/// - `None` for a variant is an error: variants always declare options.
/// - `None` for the source means "store it unprocessed" and yields `Ok(None)`.
/// - Anything else must be a table whose keys are all in [`OPTION_NAMES`].
///
/// Missing keys take their defaults; `format` defaults to `default_format`.
pub fn validate(
    raw: Option<&toml::Value>,
    is_variant: bool,
    default_format: &Format,
) -> Result<Option<ProcessingOptions>> {
    let Some(raw) = raw else {
        if is_variant {
            return Err(ThumbnailError::InvalidOption(
                "variants must always declare processing options".into(),
            ));
        }
        return Ok(None);
    };

    let table = raw.as_table().ok_or_else(|| {
        ThumbnailError::InvalidOption(format!(
            "a table of processing options is required, got {}",
            raw.type_str()
        ))
    })?;

    if let Some(key) = table
        .keys()
        .find(|key| !OPTION_NAMES.contains(&key.as_str()))
    {
        return Err(ThumbnailError::InvalidOption(format!(
            "unknown option `{key}`"
        )));
    }

    let mut options = ProcessingOptions::new(default_format.clone());
    for (key, value) in table {
        match key.as_str() {
            "size" => options.size = Some(parse_size(value)?),
            "sharpen" => options.sharpen = bool_option(key, value)?,
            "detail" => options.detail = bool_option(key, value)?,
            "upscale" => options.upscale = bool_option(key, value)?,
            "format" => options.format = format_option(value)?,
            _ => {}
        }
    }
    Ok(Some(options))
}

fn bool_option(key: &str, value: &toml::Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        ThumbnailError::InvalidOption(format!(
            "`{key}` must be a boolean, got {}",
            value.type_str()
        ))
    })
}

fn format_option(value: &toml::Value) -> Result<Format> {
    let format = value.as_str().map(Format::new).ok_or_else(|| {
        ThumbnailError::InvalidOption(format!(
            "`format` must be a string, got {}",
            value.type_str()
        ))
    })?;
    if format.is_empty() {
        return Err(ThumbnailError::InvalidOption(
            "`format` must not be empty".into(),
        ));
    }
    Ok(format)
}

/// Parse a `size` value: a `"WxH"` string or a `[w, h]` array.
fn parse_size(value: &toml::Value) -> Result<TargetSize> {
    let size = match value {
        toml::Value::String(s) => parse_size_str(s)?,
        toml::Value::Array(items) => {
            let [w, h] = items.as_slice() else {
                return Err(ThumbnailError::InvalidOption(format!(
                    "`size` array must have exactly two entries, got {}",
                    items.len()
                )));
            };
            TargetSize::new(Some(size_component(w)?), Some(size_component(h)?))
        }
        other => {
            return Err(ThumbnailError::InvalidOption(format!(
                "`size` must be a \"WxH\" string or a [width, height] array, got {}",
                other.type_str()
            )));
        }
    };
    if size.is_unspecified() {
        return Err(ThumbnailError::InvalidOption(
            "`size` must set a width or a height".into(),
        ));
    }
    Ok(size)
}

fn size_component(value: &toml::Value) -> Result<u32> {
    value
        .as_integer()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            ThumbnailError::InvalidOption(format!(
                "`size` entries must be non-negative integers, got {value}"
            ))
        })
}

/// Parse `"WxH"`, where either side may be empty (`"200x"`, `"x150"`).
pub fn parse_size_str(s: &str) -> Result<TargetSize> {
    let invalid = || ThumbnailError::InvalidOption(format!("invalid size `{s}`, expected WxH"));
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let side = |part: &str| -> Result<Option<u32>> {
        let part = part.trim();
        if part.is_empty() {
            Ok(None)
        } else {
            part.parse().map(Some).map_err(|_| invalid())
        }
    };
    Ok(TargetSize::new(side(w)?, side(h)?))
}

/// A named variant and the options that produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    identifier: String,
    options: ProcessingOptions,
}

impl VariantSpec {
    /// Build from validated options. Spaces in the identifier become
    /// underscores; empty identifiers and path separators are rejected.
    pub fn new(identifier: &str, options: ProcessingOptions) -> Result<Self> {
        let identifier = identifier.trim().replace(' ', "_");
        if identifier.is_empty() {
            return Err(ThumbnailError::InvalidOption(
                "variant identifier must not be empty".into(),
            ));
        }
        if identifier.contains(['/', '\\']) {
            return Err(ThumbnailError::InvalidOption(format!(
                "variant identifier `{identifier}` must not contain path separators"
            )));
        }
        Ok(Self {
            identifier,
            options,
        })
    }

    /// Validate raw options for a variant and build the spec.
    pub fn from_raw(
        identifier: &str,
        raw: Option<&toml::Value>,
        default_format: &Format,
    ) -> Result<Self> {
        let options = validate(raw, true, default_format)?.ok_or_else(|| {
            ThumbnailError::InvalidOption("variants must always declare processing options".into())
        })?;
        Self::new(identifier, options)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Value {
        toml::Value::Table(toml::from_str(src).unwrap())
    }

    fn validate_src(src: &str) -> Result<Option<ProcessingOptions>> {
        validate(Some(&table(src)), true, &Format::jpeg())
    }

    #[test]
    fn missing_options_on_variant_is_error() {
        let err = validate(None, true, &Format::jpeg()).unwrap_err();
        assert!(matches!(err, ThumbnailError::InvalidOption(_)));
    }

    #[test]
    fn missing_options_on_source_means_unprocessed() {
        assert_eq!(validate(None, false, &Format::jpeg()).unwrap(), None);
    }

    #[test]
    fn non_table_is_rejected() {
        let err = validate(Some(&toml::Value::Integer(3)), false, &Format::jpeg()).unwrap_err();
        assert!(matches!(err, ThumbnailError::InvalidOption(m) if m.contains("table")));
    }

    #[test]
    fn unknown_key_is_named() {
        let err = validate(Some(&table("bogus = 1")), false, &Format::jpeg()).unwrap_err();
        assert!(matches!(err, ThumbnailError::InvalidOption(m) if m.contains("bogus")));
    }

    #[test]
    fn empty_table_takes_defaults() {
        let options = validate_src("").unwrap().unwrap();
        assert_eq!(options, ProcessingOptions::new(Format::jpeg()));
    }

    #[test]
    fn default_format_comes_from_caller() {
        let options = validate(Some(&table("")), true, &Format::png()).unwrap().unwrap();
        assert_eq!(options.format, Format::png());
    }

    #[test]
    fn supplied_keys_override_defaults() {
        let options = validate_src(
            r#"
            size = "200x150"
            sharpen = true
            detail = true
            upscale = true
            format = "png"
            "#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(options.size, Some(TargetSize::exact(200, 150)));
        assert!(options.sharpen && options.detail && options.upscale);
        assert_eq!(options.format, Format::png());
    }

    #[test]
    fn size_string_forms() {
        assert_eq!(parse_size_str("200x").unwrap(), TargetSize::new(Some(200), None));
        assert_eq!(parse_size_str("x150").unwrap(), TargetSize::new(None, Some(150)));
        assert_eq!(parse_size_str(" 64X48 ").unwrap(), TargetSize::exact(64, 48));
        assert!(parse_size_str("200").is_err());
        assert!(parse_size_str("ax10").is_err());
        assert!(parse_size_str("-5x10").is_err());
    }

    #[test]
    fn size_array_with_zero_derives() {
        let options = validate_src("size = [0, 120]").unwrap().unwrap();
        assert_eq!(options.size, Some(TargetSize::new(None, Some(120))));
    }

    #[test]
    fn unspecified_size_is_rejected() {
        assert!(validate_src(r#"size = "x""#).is_err());
        assert!(validate_src("size = [0, 0]").is_err());
    }

    #[test]
    fn malformed_values_are_rejected() {
        for src in [
            "sharpen = \"yes\"",
            "upscale = 1",
            "format = 5",
            "format = \"\"",
            "size = [1, 2, 3]",
            "size = [-1, 2]",
            "size = 200",
        ] {
            let err = validate_src(src).unwrap_err();
            assert!(matches!(err, ThumbnailError::InvalidOption(_)), "{src}");
        }
    }

    #[test]
    fn filters_apply_sharpen_before_detail() {
        let mut options = ProcessingOptions::new(Format::jpeg());
        assert_eq!(options.filters().count(), 0);

        options.detail = true;
        options.sharpen = true;
        assert_eq!(
            options.filters().collect::<Vec<_>>(),
            vec![Filter::Sharpen, Filter::Detail]
        );
    }

    #[test]
    fn variant_identifier_spaces_become_underscores() {
        let spec = VariantSpec::new("large square", ProcessingOptions::new(Format::jpeg())).unwrap();
        assert_eq!(spec.identifier(), "large_square");
    }

    #[test]
    fn variant_identifier_must_be_usable() {
        let options = ProcessingOptions::new(Format::jpeg());
        assert!(VariantSpec::new("  ", options.clone()).is_err());
        assert!(VariantSpec::new("a/b", options).is_err());
    }

    #[test]
    fn variant_from_raw_requires_options() {
        let err = VariantSpec::from_raw("small", None, &Format::jpeg()).unwrap_err();
        assert!(matches!(err, ThumbnailError::InvalidOption(_)));

        let spec = VariantSpec::from_raw("small", Some(&table("sharpen = true")), &Format::jpeg())
            .unwrap();
        assert!(spec.options().sharpen);
    }
}
