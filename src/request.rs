//! The caller-facing conversion request.

use crate::error::HtmlPdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page orientation as requested by the caller.
///
/// Parsing from text is strict: only `portrait` and `landscape` (any ASCII
/// case) are accepted, everything else is [`HtmlPdfError::InvalidOrientation`].
/// The lenient "anything but landscape is portrait" rule applies only to the
/// `pdf_orientation` setting and lives in [`crate::settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = HtmlPdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("portrait") {
            Ok(Orientation::Portrait)
        } else if trimmed.eq_ignore_ascii_case("landscape") {
            Ok(Orientation::Landscape)
        } else {
            Err(HtmlPdfError::InvalidOrientation {
                value: s.to_string(),
            })
        }
    }
}

impl TryFrom<String> for Orientation {
    type Error = HtmlPdfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Orientation> for String {
    fn from(o: Orientation) -> Self {
        o.as_str().to_string()
    }
}

/// One HTML-to-PDF conversion.
///
/// Everything except `html` and `file_name` is optional; unset fields are
/// filled from the settings store during conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversionRequest {
    /// The HTML document to render.
    pub html: String,
    /// Explicit orientation; `None` defers to `pdf_orientation`.
    pub orientation: Option<Orientation>,
    /// Header template; blank defers to `pdf_header_text`.
    pub header: Option<String>,
    /// Footer template; blank defers to `pdf_footer_text`.
    pub footer: Option<String>,
    /// Engine option overrides, `Key:Value;Key:Value`.
    /// See [`crate::pipeline::overlay::OverrideSet`].
    pub document_options: Option<String>,
    /// Content item that owns the background image property.
    pub item_id: Option<u64>,
    /// Name of the property holding the background image.
    pub background_property_name: Option<String>,
    /// Background image URL given directly; skips the item lookup.
    pub background_url: Option<String>,
    /// Suggested download name; sanitized before use.
    pub file_name: String,
}

impl ConversionRequest {
    pub fn new(html: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn document_options(mut self, options: impl Into<String>) -> Self {
        self.document_options = Some(options.into());
        self
    }

    pub fn background(mut self, item_id: u64, property_name: impl Into<String>) -> Self {
        self.item_id = Some(item_id);
        self.background_property_name = Some(property_name.into());
        self
    }

    pub fn background_url(mut self, url: impl Into<String>) -> Self {
        self.background_url = Some(url.into());
        self
    }
}

/// Treat `None` and whitespace-only strings alike.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_parse_is_case_insensitive() {
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert_eq!("PORTRAIT".parse::<Orientation>().unwrap(), Orientation::Portrait);
    }

    #[test]
    fn orientation_parse_rejects_unknown_values() {
        let err = "sideways".parse::<Orientation>().unwrap_err();
        assert!(matches!(err, HtmlPdfError::InvalidOrientation { .. }));
        assert!("".parse::<Orientation>().is_err());
    }

    #[test]
    fn request_deserialises_from_camel_case_json() {
        let req: ConversionRequest = serde_json::from_str(
            r#"{
                "html": "<p>hi</p>",
                "orientation": "landscape",
                "documentOptions": "ConversionDelay:5",
                "itemId": 42,
                "backgroundPropertyName": "bg",
                "fileName": "report"
            }"#,
        )
        .unwrap();
        assert_eq!(req.orientation, Some(Orientation::Landscape));
        assert_eq!(req.document_options.as_deref(), Some("ConversionDelay:5"));
        assert_eq!(req.item_id, Some(42));
        assert_eq!(req.file_name, "report");
    }

    #[test]
    fn request_json_with_bad_orientation_fails() {
        let result: Result<ConversionRequest, _> =
            serde_json::from_str(r#"{"html": "", "orientation": "upside-down"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("x")), Some("x"));
    }
}
