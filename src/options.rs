//! Engine-level option objects.
//!
//! These mirror the option surface of the external HTML-to-PDF engine. The
//! converter fills them from resolved settings, the overlay stage patches
//! them from the request's override string, and the engine adapter receives
//! them by reference. Field names serialise in PascalCase, the same names
//! operators use in override strings (`ConversionDelay:5`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Paper size understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    A8,
    A9,
    A10,
    /// Explicit dimensions in points. Not validated: zero or negative values
    /// are handed to the engine unchanged.
    Custom { width: i32, height: i32 },
}

impl PageSize {
    /// The eleven named ISO sizes, A0 first.
    pub const NAMED: [PageSize; 11] = [
        PageSize::A0,
        PageSize::A1,
        PageSize::A2,
        PageSize::A3,
        PageSize::A4,
        PageSize::A5,
        PageSize::A6,
        PageSize::A7,
        PageSize::A8,
        PageSize::A9,
        PageSize::A10,
    ];

    /// Exact, case-sensitive lookup of a named size.
    pub fn from_name(name: &str) -> Option<PageSize> {
        PageSize::NAMED.into_iter().find(|s| s.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PageSize::A0 => "A0",
            PageSize::A1 => "A1",
            PageSize::A2 => "A2",
            PageSize::A3 => "A3",
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::A6 => "A6",
            PageSize::A7 => "A7",
            PageSize::A8 => "A8",
            PageSize::A9 => "A9",
            PageSize::A10 => "A10",
            PageSize::Custom { .. } => "CUSTOM",
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Custom { width, height } => write!(f, "CUSTOM({width}x{height})"),
            named => f.write_str(named.name()),
        }
    }
}

/// Orientation as the engine names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdfPageOrientation {
    #[default]
    Portrait,
    Landscape,
}

impl From<crate::request::Orientation> for PdfPageOrientation {
    fn from(o: crate::request::Orientation) -> Self {
        match o {
            crate::request::Orientation::Portrait => PdfPageOrientation::Portrait,
            crate::request::Orientation::Landscape => PdfPageOrientation::Landscape,
        }
    }
}

/// Top-level converter options.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConverterOptions {
    /// Engine license key from process configuration.
    pub license_key: Option<String>,
    /// Seconds to wait after load before converting, so scripts can settle.
    pub conversion_delay: u32,
    /// Seconds before a page load is abandoned.
    pub navigation_timeout: u32,
    /// Viewport width in pixels.
    pub html_viewer_width: i32,
    /// Viewport height in pixels; `0` lets the engine size to content.
    pub html_viewer_height: i32,
    pub java_script_enabled: bool,
    /// CSS media type used while rendering (`screen` or `print`).
    pub media_type: String,
    /// Loader executable the engine spawns. Never overridable per request.
    pub html_loader_file_path: Option<String>,
    pub pdf_document_options: DocumentOptions,
    pub pdf_security_options: SecurityOptions,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            license_key: None,
            conversion_delay: 2,
            navigation_timeout: 60,
            html_viewer_width: 1024,
            html_viewer_height: 0,
            java_script_enabled: true,
            media_type: "screen".to_string(),
            html_loader_file_path: None,
            pdf_document_options: DocumentOptions::default(),
            pdf_security_options: SecurityOptions::default(),
        }
    }
}

impl fmt::Debug for ConverterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterOptions")
            .field("license_key", &self.license_key.as_ref().map(|_| "<redacted>"))
            .field("conversion_delay", &self.conversion_delay)
            .field("navigation_timeout", &self.navigation_timeout)
            .field("html_viewer_width", &self.html_viewer_width)
            .field("html_viewer_height", &self.html_viewer_height)
            .field("java_script_enabled", &self.java_script_enabled)
            .field("media_type", &self.media_type)
            .field("html_loader_file_path", &self.html_loader_file_path)
            .field("pdf_document_options", &self.pdf_document_options)
            .field("pdf_security_options", &self.pdf_security_options)
            .finish()
    }
}

impl ConverterOptions {
    /// A copy with the license key and passwords masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.license_key.is_some() {
            copy.license_key = Some("<redacted>".to_string());
        }
        let security = &mut copy.pdf_security_options;
        if !security.owner_password.is_empty() {
            security.owner_password = "<redacted>".to_string();
        }
        if !security.user_password.is_empty() {
            security.user_password = "<redacted>".to_string();
        }
        copy
    }
}

/// Page layout and header/footer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentOptions {
    pub pdf_page_size: PageSize,
    pub pdf_page_orientation: PdfPageOrientation,
    /// Let the engine widen the page to fit wide content.
    pub auto_resize_pdf_page_width: bool,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub left_margin: f32,
    pub right_margin: f32,
    pub enable_header_footer: bool,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    /// Header band height in points.
    pub header_height: f32,
    /// Footer band height in points.
    pub footer_height: f32,
    pub show_header_in_first_page: bool,
    pub show_footer_in_first_page: bool,
    pub fit_width: bool,
    pub single_page: bool,
    pub embed_fonts: bool,
    pub jpeg_compression_enabled: bool,
    /// 0 (best quality) to 100 (smallest file).
    pub jpeg_compression_level: u32,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            pdf_page_size: PageSize::A4,
            pdf_page_orientation: PdfPageOrientation::Portrait,
            auto_resize_pdf_page_width: true,
            top_margin: 0.0,
            bottom_margin: 0.0,
            left_margin: 0.0,
            right_margin: 0.0,
            enable_header_footer: false,
            header_template: None,
            footer_template: None,
            header_height: 50.0,
            footer_height: 50.0,
            show_header_in_first_page: true,
            show_footer_in_first_page: true,
            fit_width: true,
            single_page: false,
            embed_fonts: false,
            jpeg_compression_enabled: true,
            jpeg_compression_level: 10,
        }
    }
}

/// Document permissions and passwords.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityOptions {
    pub can_edit_content: bool,
    pub can_copy_content: bool,
    pub can_print: bool,
    /// Required to change permissions; never blank after resolution.
    pub owner_password: String,
    /// Required to open the document; blank means no open password.
    pub user_password: String,
}

impl Default for SecurityOptions {
    fn default() -> Self {
        Self {
            can_edit_content: false,
            can_copy_content: true,
            can_print: true,
            owner_password: String::new(),
            user_password: String::new(),
        }
    }
}

impl fmt::Debug for SecurityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |s: &str| if s.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("SecurityOptions")
            .field("can_edit_content", &self.can_edit_content)
            .field("can_copy_content", &self.can_copy_content)
            .field("can_print", &self.can_print)
            .field("owner_password", &mask(&self.owner_password))
            .field("user_password", &mask(&self.user_password))
            .finish()
    }
}
