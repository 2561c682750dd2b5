//! Operator overrides: `Key:Value;Key:Value` patched onto engine options.
//!
//! ## Format
//!
//! ```text
//! ConversionDelay:5;JpegCompressionLevel:30;PdfPageOrientation:Landscape
//! ```
//!
//! * Tokens are separated by `;`.
//! * A token is split at its first `:` into key and value; both are trimmed.
//!   Everything after the first colon is the value, so URLs survive intact.
//! * Tokens without a `:` (or with an empty key) are dropped silently.
//! * Keys match option names case-insensitively.
//! * When a key appears more than once, the last occurrence wins.
//!
//! ## Registry
//!
//! Each overridable type exposes a static table of [`OptionField`]s: the
//! option's canonical name plus a setter that parses the raw text into the
//! field's declared type. Matching is done per target object, so a key
//! that exists on two objects sets both, each through its own setter.
//!
//! Unknown keys are ignored; a value that cannot be parsed into the
//! declared type is a [`CoercionError`] and aborts the request.

use crate::error::CoercionError;
use crate::options::{ConverterOptions, DocumentOptions, PdfPageOrientation};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

// ── Override set ─────────────────────────────────────────────────────────

/// Parsed override string, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    entries: Vec<(String, String)>,
}

impl OverrideSet {
    pub fn parse(input: &str) -> Self {
        let entries = input
            .split(';')
            .filter_map(|token| token.split_once(':'))
            .map(|(key, value)| (key.trim(), value.trim()))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { entries }
    }

    /// Value for `key` (case-insensitive); the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for OverrideSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for OverrideSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}:{value}")?;
        }
        Ok(())
    }
}

// ── Typed coercion ───────────────────────────────────────────────────────

/// A type an override value can be coerced into.
pub trait OptionValue: Sized {
    /// Describes the type in error messages.
    const EXPECTED: &'static str;

    fn coerce(raw: &str) -> Option<Self>;
}

impl OptionValue for bool {
    const EXPECTED: &'static str = "a boolean (true/false)";

    fn coerce(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl OptionValue for i32 {
    const EXPECTED: &'static str = "an integer";

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl OptionValue for u32 {
    const EXPECTED: &'static str = "a non-negative integer";

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl OptionValue for f32 {
    const EXPECTED: &'static str = "a number";

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

impl OptionValue for String {
    const EXPECTED: &'static str = "text";

    fn coerce(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl OptionValue for Option<String> {
    const EXPECTED: &'static str = "text";

    fn coerce(raw: &str) -> Option<Self> {
        Some(Some(raw.to_string()))
    }
}

impl OptionValue for PdfPageOrientation {
    const EXPECTED: &'static str = "Portrait or Landscape";

    fn coerce(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("portrait") {
            Some(PdfPageOrientation::Portrait)
        } else if raw.eq_ignore_ascii_case("landscape") {
            Some(PdfPageOrientation::Landscape)
        } else {
            None
        }
    }
}

/// Parse `raw` into `slot`'s type and assign it.
pub fn coerce_into<V: OptionValue>(
    slot: &mut V,
    option: &'static str,
    raw: &str,
) -> Result<(), CoercionError> {
    *slot = V::coerce(raw).ok_or_else(|| CoercionError {
        option,
        value: raw.to_string(),
        expected: V::EXPECTED,
    })?;
    Ok(())
}

// ── Registry ─────────────────────────────────────────────────────────────

/// One overridable option of `T`.
pub struct OptionField<T> {
    /// Canonical option name, e.g. `ConversionDelay`.
    pub name: &'static str,
    pub apply: fn(&mut T, &str) -> Result<(), CoercionError>,
}

/// A type whose options can be set by name.
pub trait Overlay: Sized + 'static {
    fn fields() -> &'static [OptionField<Self>];
}

/// Registry entry for `$ty.$field` under the option name `$name`.
macro_rules! option_field {
    ($ty:ty, $name:literal => $field:ident) => {
        OptionField::<$ty> {
            name: $name,
            apply: |target: &mut $ty, raw: &str| coerce_into(&mut target.$field, $name, raw),
        }
    };
}

static CONVERTER_FIELDS: &[OptionField<ConverterOptions>] = &[
    option_field!(ConverterOptions, "ConversionDelay" => conversion_delay),
    option_field!(ConverterOptions, "NavigationTimeout" => navigation_timeout),
    option_field!(ConverterOptions, "HtmlViewerWidth" => html_viewer_width),
    option_field!(ConverterOptions, "HtmlViewerHeight" => html_viewer_height),
    option_field!(ConverterOptions, "JavaScriptEnabled" => java_script_enabled),
    option_field!(ConverterOptions, "MediaType" => media_type),
];

static DOCUMENT_FIELDS: &[OptionField<DocumentOptions>] = &[
    option_field!(DocumentOptions, "PdfPageOrientation" => pdf_page_orientation),
    option_field!(DocumentOptions, "AutoResizePdfPageWidth" => auto_resize_pdf_page_width),
    option_field!(DocumentOptions, "TopMargin" => top_margin),
    option_field!(DocumentOptions, "BottomMargin" => bottom_margin),
    option_field!(DocumentOptions, "LeftMargin" => left_margin),
    option_field!(DocumentOptions, "RightMargin" => right_margin),
    option_field!(DocumentOptions, "EnableHeaderFooter" => enable_header_footer),
    option_field!(DocumentOptions, "HeaderTemplate" => header_template),
    option_field!(DocumentOptions, "FooterTemplate" => footer_template),
    option_field!(DocumentOptions, "HeaderHeight" => header_height),
    option_field!(DocumentOptions, "FooterHeight" => footer_height),
    option_field!(DocumentOptions, "ShowHeaderInFirstPage" => show_header_in_first_page),
    option_field!(DocumentOptions, "ShowFooterInFirstPage" => show_footer_in_first_page),
    option_field!(DocumentOptions, "FitWidth" => fit_width),
    option_field!(DocumentOptions, "SinglePage" => single_page),
    option_field!(DocumentOptions, "EmbedFonts" => embed_fonts),
    option_field!(DocumentOptions, "JpegCompressionEnabled" => jpeg_compression_enabled),
    option_field!(DocumentOptions, "JpegCompressionLevel" => jpeg_compression_level),
];

impl Overlay for ConverterOptions {
    fn fields() -> &'static [OptionField<Self>] {
        CONVERTER_FIELDS
    }
}

impl Overlay for DocumentOptions {
    fn fields() -> &'static [OptionField<Self>] {
        DOCUMENT_FIELDS
    }
}

/// Apply every matching override to one target. Returns the names set.
pub fn apply_overrides<T: Overlay>(
    target: &mut T,
    overrides: &OverrideSet,
) -> Result<Vec<&'static str>, CoercionError> {
    let mut applied = Vec::new();
    for field in T::fields() {
        if let Some(raw) = overrides.get(field.name) {
            (field.apply)(target, raw)?;
            applied.push(field.name);
        }
    }
    Ok(applied)
}

/// Apply overrides to the converter, then to its document options.
pub fn apply_to_converter(
    options: &mut ConverterOptions,
    overrides: &OverrideSet,
) -> Result<Vec<&'static str>, CoercionError> {
    if overrides.is_empty() {
        return Ok(Vec::new());
    }

    let mut applied = apply_overrides(options, overrides)?;
    applied.extend(apply_overrides(&mut options.pdf_document_options, overrides)?);

    for (key, _) in overrides.iter() {
        if !applied.iter().any(|name| name.eq_ignore_ascii_case(key)) {
            warn!("Ignoring unknown document option '{}'", key);
        }
    }
    debug!("Applied document options: {:?}", applied);

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_tokens_are_dropped() {
        let set = OverrideSet::parse("Foo:1;Bar:2;Malformed");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("foo"), Some("1"));
        assert_eq!(set.get("BAR"), Some("2"));
        assert_eq!(set.get("Malformed"), None);
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(OverrideSet::parse("").is_empty());
        assert!(OverrideSet::parse(";;;").is_empty());
        assert!(OverrideSet::parse(":5").is_empty());
    }

    #[test]
    fn value_keeps_text_after_first_colon() {
        let set = OverrideSet::parse("BaseUrl:https://example.com:8443/x");
        assert_eq!(set.get("BaseUrl"), Some("https://example.com:8443/x"));
    }

    #[test]
    fn last_duplicate_wins() {
        let set = OverrideSet::parse("ConversionDelay:1;conversiondelay:7");
        assert_eq!(set.get("ConversionDelay"), Some("7"));

        let mut options = ConverterOptions::default();
        apply_to_converter(&mut options, &set).unwrap();
        assert_eq!(options.conversion_delay, 7);
    }

    #[test]
    fn display_round_trips() {
        let text = "ConversionDelay:5;TopMargin:12.5;HeaderTemplate:<b>Title</b>";
        let set: OverrideSet = text.parse().unwrap();
        assert_eq!(set.to_string(), text);
        assert_eq!(set.to_string().parse::<OverrideSet>().unwrap(), set);
    }

    #[test]
    fn whitespace_around_tokens_is_trimmed() {
        let set = OverrideSet::parse(" ConversionDelay : 4 ; FitWidth:false ");
        let mut options = ConverterOptions::default();
        let applied = apply_to_converter(&mut options, &set).unwrap();
        assert_eq!(options.conversion_delay, 4);
        assert!(!options.pdf_document_options.fit_width);
        assert_eq!(applied, vec!["ConversionDelay", "FitWidth"]);
    }

    #[test]
    fn applies_typed_values_to_both_levels() {
        let set = OverrideSet::parse(
            "conversiondelay:5;JAVASCRIPTENABLED:False;TopMargin:7.5;\
             PdfPageOrientation:landscape;JpegCompressionLevel:30;FooterTemplate:p. {page}",
        );
        let mut options = ConverterOptions::default();
        apply_to_converter(&mut options, &set).unwrap();

        assert_eq!(options.conversion_delay, 5);
        assert!(!options.java_script_enabled);
        let doc = &options.pdf_document_options;
        assert_eq!(doc.top_margin, 7.5);
        assert_eq!(doc.pdf_page_orientation, PdfPageOrientation::Landscape);
        assert_eq!(doc.jpeg_compression_level, 30);
        assert_eq!(doc.footer_template.as_deref(), Some("p. {page}"));
    }

    #[test]
    fn unmatched_fields_keep_their_values() {
        let mut options = ConverterOptions::default();
        options.pdf_document_options.left_margin = 10.0;
        apply_to_converter(&mut options, &OverrideSet::parse("Unknown:1")).unwrap();
        assert_eq!(options.pdf_document_options.left_margin, 10.0);
        assert_eq!(options.conversion_delay, 2);
    }

    #[test]
    fn coercion_failure_is_fatal() {
        let mut options = ConverterOptions::default();
        let err = apply_to_converter(&mut options, &OverrideSet::parse("ConversionDelay:soon"))
            .unwrap_err();
        assert_eq!(err.option, "ConversionDelay");
        assert_eq!(err.value, "soon");
        assert_eq!(err.expected, "a non-negative integer");
    }

    #[test]
    fn bad_values_per_type_are_rejected() {
        for bad in [
            "ConversionDelay:-1",
            "JavaScriptEnabled:yes",
            "TopMargin:wide",
            "TopMargin:NaN",
            "PdfPageOrientation:diagonal",
            "HtmlViewerWidth:1.5",
        ] {
            let mut options = ConverterOptions::default();
            assert!(
                apply_to_converter(&mut options, &OverrideSet::parse(bad)).is_err(),
                "expected failure for {bad}"
            );
        }
    }

    #[test]
    fn loader_path_and_secrets_are_not_overridable() {
        let set = OverrideSet::parse(
            "HtmlLoaderFilePath:/tmp/evil;OwnerPassword:x;LicenseKey:y;PdfPageSize:A3",
        );
        let mut options = ConverterOptions::default();
        let applied = apply_to_converter(&mut options, &set).unwrap();
        assert!(applied.is_empty());
        assert_eq!(options, ConverterOptions::default());
    }

    // Two unrelated targets that both expose `Width`.
    #[derive(Default)]
    struct Outer {
        width: i32,
    }

    #[derive(Default)]
    struct Inner {
        width: i32,
        label: String,
    }

    static OUTER_FIELDS: &[OptionField<Outer>] = &[option_field!(Outer, "Width" => width)];
    static INNER_FIELDS: &[OptionField<Inner>] = &[
        option_field!(Inner, "Width" => width),
        option_field!(Inner, "Label" => label),
    ];

    impl Overlay for Outer {
        fn fields() -> &'static [OptionField<Self>] {
            OUTER_FIELDS
        }
    }

    impl Overlay for Inner {
        fn fields() -> &'static [OptionField<Self>] {
            INNER_FIELDS
        }
    }

    #[test]
    fn shared_key_sets_each_target_independently() {
        let set = OverrideSet::parse("width:640;Label:main");
        let mut outer = Outer::default();
        let mut inner = Inner::default();

        assert_eq!(apply_overrides(&mut outer, &set).unwrap(), vec!["Width"]);
        assert_eq!(apply_overrides(&mut inner, &set).unwrap(), vec!["Width", "Label"]);

        assert_eq!(outer.width, 640);
        assert_eq!(inner.width, 640);
        assert_eq!(inner.label, "main");
    }
}
