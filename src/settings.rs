//! Settings store access and the typed per-request settings schema.
//!
//! Operators tune PDF output through a key/value settings store (names such
//! as `pdf_pagesize` or `pdf_margins`). Every value in that store is a
//! string, so all of the "stringly-typed" parsing is confined to this
//! module: [`PdfSettings::load`] queries each key exactly once and produces
//! a typed snapshot that the rest of the pipeline consumes.
//!
//! ## Coercion policy
//!
//! Parsing here is deliberately lenient and never fails:
//!
//! | Kind    | Rule |
//! |---------|------|
//! | boolean | `true` iff the value equals `"true"` (ASCII case-insensitive) |
//! | integer | best-effort `i32` parse; anything unparsable is `0` |
//! | enum    | case-insensitive match against one expected literal |
//!
//! This is the opposite of the override overlay in
//! [`crate::pipeline::overlay`], where a bad value aborts the request.

use crate::error::HtmlPdfError;
use crate::request::Orientation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Names of every setting read by the converter.
pub mod keys {
    pub const ORIENTATION: &str = "pdf_orientation";
    pub const HTML_VIEWER_WIDTH: &str = "pdf_html_viewer_width";
    pub const HTML_VIEWER_HEIGHT: &str = "pdf_html_viewer_height";
    pub const MARGINS: &str = "pdf_margins";
    pub const AVOID_TEXT_BREAK: &str = "pdf_avoid_text_break";
    pub const AVOID_IMAGE_BREAK: &str = "pdf_avoid_image_break";
    pub const PAGE_SIZE: &str = "pdf_pagesize";
    pub const PAGE_SIZE_WIDTH: &str = "pdf_pagesize_width";
    pub const PAGE_SIZE_HEIGHT: &str = "pdf_pagesize_height";
    pub const HEADER_SHOW: &str = "pdf_header_show";
    pub const FOOTER_SHOW: &str = "pdf_footer_show";
    pub const HEADER_TEXT: &str = "pdf_header_text";
    pub const FOOTER_TEXT: &str = "pdf_footer_text";
    pub const CAN_EDIT_CONTENT: &str = "pdf_can_edit_content";
    pub const CAN_COPY_CONTENT: &str = "pdf_can_copy_content";
    pub const PASSWORD: &str = "pdf_password";
    pub const BASEURL_OVERRIDE: &str = "pdf_baseurl_override";
}

/// Remote key/value settings lookup.
///
/// Implementations must be safe for concurrent reads: the converter may
/// serve several requests at once against one store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Return the stored value for `name`, or `default` when the setting is
    /// absent or empty.
    async fn get(&self, name: &str, default: &str) -> Result<String, HtmlPdfError>;
}

/// A store with nothing in it; every lookup yields its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSettings;

#[async_trait]
impl SettingsStore for NoopSettings {
    async fn get(&self, _name: &str, default: &str) -> Result<String, HtmlPdfError> {
        Ok(default.to_string())
    }
}

/// In-memory settings, e.g. loaded from a JSON file by the CLI.
#[derive(Debug, Default, Clone)]
pub struct MapSettings {
    values: HashMap<String, String>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a flat JSON object. Non-string scalars are stored in their JSON
    /// text form (`10` → `"10"`, `true` → `"true"`); nested values are
    /// rejected.
    pub fn from_json(json: &str) -> Result<Self, HtmlPdfError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| HtmlPdfError::InvalidConfig(format!("settings JSON: {e}")))?;

        let mut settings = Self::new();
        for (name, value) in raw {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(HtmlPdfError::InvalidConfig(format!(
                        "setting '{name}' must be a scalar, got {other}"
                    )))
                }
            };
            settings.insert(name, text);
        }
        Ok(settings)
    }
}

impl FromIterator<(String, String)> for MapSettings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SettingsStore for MapSettings {
    async fn get(&self, name: &str, default: &str) -> Result<String, HtmlPdfError> {
        Ok(match self.values.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => default.to_string(),
        })
    }
}

// ── Lenient coercion ─────────────────────────────────────────────────────

/// `true` iff `value` equals `"true"`, ignoring ASCII case.
pub fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Best-effort integer parse; unparsable input is `0`.
pub fn parse_int(value: &str) -> i32 {
    value.trim().parse().unwrap_or(0)
}

/// Typed lookups over a [`SettingsStore`].
#[derive(Clone, Copy)]
pub struct SettingsResolver<'a> {
    store: &'a dyn SettingsStore,
}

impl<'a> SettingsResolver<'a> {
    pub fn new(store: &'a dyn SettingsStore) -> Self {
        Self { store }
    }

    /// Raw string value with an explicit default.
    pub async fn string(&self, name: &str, default: &str) -> Result<String, HtmlPdfError> {
        self.store.get(name, default).await
    }

    /// Boolean setting; `default` is the string used when the key is absent.
    pub async fn flag(&self, name: &str, default: &str) -> Result<bool, HtmlPdfError> {
        Ok(parse_flag(&self.store.get(name, default).await?))
    }

    /// Integer setting, `0` when absent or unparsable.
    pub async fn int(&self, name: &str) -> Result<i32, HtmlPdfError> {
        Ok(parse_int(&self.store.get(name, "").await?))
    }

    /// `true` iff the stored value equals `expected`, ignoring ASCII case.
    pub async fn matches(&self, name: &str, expected: &str) -> Result<bool, HtmlPdfError> {
        Ok(self.store.get(name, "").await?.eq_ignore_ascii_case(expected))
    }
}

// ── Typed schema ─────────────────────────────────────────────────────────

/// Snapshot of every PDF-related setting, resolved once per request.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfSettings {
    /// Fallback orientation when the request does not specify one.
    pub orientation: Orientation,
    /// Engine viewport width in pixels; ignored unless > 0.
    pub html_viewer_width: i32,
    /// Engine viewport height in pixels; ignored unless > 0.
    pub html_viewer_height: i32,
    /// Margin applied to all four sides, in points.
    pub margins: i32,
    pub avoid_text_break: bool,
    pub avoid_image_break: bool,
    /// Raw page-size name, `A4` when unset. Matched by the geometry stage.
    pub page_size: String,
    /// Width in points, used only with `CUSTOM`.
    pub page_width: i32,
    /// Height in points, used only with `CUSTOM`.
    pub page_height: i32,
    pub header_show: bool,
    pub footer_show: bool,
    pub header_text: String,
    pub footer_text: String,
    pub can_edit_content: bool,
    pub can_copy_content: bool,
    /// Configured owner secret, possibly containing placeholders.
    pub password: String,
    /// Base URL that takes precedence over the request context's URL.
    pub baseurl_override: Option<String>,
}

impl Default for PdfSettings {
    /// The values an empty settings store resolves to.
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            html_viewer_width: 0,
            html_viewer_height: 0,
            margins: 0,
            avoid_text_break: false,
            avoid_image_break: true,
            page_size: "A4".to_string(),
            page_width: 0,
            page_height: 0,
            header_show: false,
            footer_show: false,
            header_text: String::new(),
            footer_text: String::new(),
            can_edit_content: false,
            can_copy_content: true,
            password: String::new(),
            baseurl_override: None,
        }
    }
}

impl fmt::Debug for PdfSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfSettings")
            .field("orientation", &self.orientation)
            .field("html_viewer_width", &self.html_viewer_width)
            .field("html_viewer_height", &self.html_viewer_height)
            .field("margins", &self.margins)
            .field("avoid_text_break", &self.avoid_text_break)
            .field("avoid_image_break", &self.avoid_image_break)
            .field("page_size", &self.page_size)
            .field("page_width", &self.page_width)
            .field("page_height", &self.page_height)
            .field("header_show", &self.header_show)
            .field("footer_show", &self.footer_show)
            .field("can_edit_content", &self.can_edit_content)
            .field("can_copy_content", &self.can_copy_content)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("baseurl_override", &self.baseurl_override)
            .finish()
    }
}

impl PdfSettings {
    /// Query every key from `store` and coerce the results.
    ///
    /// Lookups are independent reads and are issued concurrently.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, HtmlPdfError> {
        let r = SettingsResolver::new(store);

        let (
            landscape,
            html_viewer_width,
            html_viewer_height,
            margins,
            avoid_text_break,
            avoid_image_break,
            page_size,
            page_width,
            page_height,
            header_show,
            footer_show,
            header_text,
            footer_text,
            can_edit_content,
            can_copy_content,
            password,
            baseurl_override,
        ) = futures::try_join!(
            r.matches(keys::ORIENTATION, "landscape"),
            r.int(keys::HTML_VIEWER_WIDTH),
            r.int(keys::HTML_VIEWER_HEIGHT),
            r.int(keys::MARGINS),
            r.flag(keys::AVOID_TEXT_BREAK, "false"),
            r.flag(keys::AVOID_IMAGE_BREAK, "true"),
            r.string(keys::PAGE_SIZE, "A4"),
            r.int(keys::PAGE_SIZE_WIDTH),
            r.int(keys::PAGE_SIZE_HEIGHT),
            r.flag(keys::HEADER_SHOW, "false"),
            r.flag(keys::FOOTER_SHOW, "false"),
            r.string(keys::HEADER_TEXT, ""),
            r.string(keys::FOOTER_TEXT, ""),
            r.flag(keys::CAN_EDIT_CONTENT, "false"),
            r.flag(keys::CAN_COPY_CONTENT, "true"),
            r.string(keys::PASSWORD, ""),
            r.string(keys::BASEURL_OVERRIDE, ""),
        )?;

        let settings = Self {
            orientation: if landscape {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            },
            html_viewer_width,
            html_viewer_height,
            margins,
            avoid_text_break,
            avoid_image_break,
            page_size,
            page_width,
            page_height,
            header_show,
            footer_show,
            header_text,
            footer_text,
            can_edit_content,
            can_copy_content,
            password,
            baseurl_override: Some(baseurl_override).filter(|s| !s.trim().is_empty()),
        };

        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    /// Header/footer slots are enabled when either one is shown.
    pub fn header_footer_enabled(&self) -> bool {
        self.header_show || self.footer_show
    }
}
