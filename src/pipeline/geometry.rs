//! Page geometry: paper size, orientation and margins.
//!
//! ## Resolution rules
//!
//! * The page-size name is matched exactly (case-sensitive) against `A0`
//!   through `A10`. The sentinel `CUSTOM` selects explicit width/height.
//!   Anything else falls back to `A4`; a typo in the settings store never
//!   stops a document from rendering.
//! * Custom dimensions are passed through as configured, zero and negative
//!   values included. They also switch off the engine's automatic page-width
//!   resizing, otherwise the engine would widen the page past the requested
//!   size.
//! * Orientation comes from the request when set, else from the settings.

use crate::options::{DocumentOptions, PageSize, PdfPageOrientation};
use crate::request::Orientation;
use crate::settings::PdfSettings;
use tracing::debug;

/// The settings-store sentinel selecting explicit dimensions.
pub const CUSTOM_PAGE_SIZE: &str = "CUSTOM";

/// Resolved geometry for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGeometry {
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// Applied to all four sides.
    pub margins: i32,
    /// Whether the engine may widen the page to fit content.
    pub auto_resize_width: bool,
}

/// Map a page-size name and custom dimensions to a [`PageSize`].
pub fn resolve_page_size(name: &str, custom_width: i32, custom_height: i32) -> PageSize {
    if name == CUSTOM_PAGE_SIZE {
        return PageSize::Custom {
            width: custom_width,
            height: custom_height,
        };
    }
    PageSize::from_name(name).unwrap_or_else(|| {
        debug!("Unknown page size '{}', using A4", name);
        PageSize::A4
    })
}

/// Explicit request orientation wins over the stored default.
pub fn resolve_orientation(requested: Option<Orientation>, fallback: Orientation) -> Orientation {
    requested.unwrap_or(fallback)
}

/// Derive the geometry for a request.
pub fn resolve(requested: Option<Orientation>, settings: &PdfSettings) -> ResolvedGeometry {
    let orientation = resolve_orientation(requested, settings.orientation);
    let page_size = resolve_page_size(&settings.page_size, settings.page_width, settings.page_height);
    let auto_resize_width = !matches!(page_size, PageSize::Custom { .. });

    ResolvedGeometry {
        page_size,
        orientation,
        margins: settings.margins,
        auto_resize_width,
    }
}

impl ResolvedGeometry {
    /// Write the geometry onto the engine's document options.
    pub fn apply_to(&self, document: &mut DocumentOptions) {
        document.pdf_page_size = self.page_size;
        document.pdf_page_orientation = PdfPageOrientation::from(self.orientation);
        document.auto_resize_pdf_page_width = self.auto_resize_width;

        let margin = self.margins as f32;
        document.top_margin = margin;
        document.bottom_margin = margin;
        document.left_margin = margin;
        document.right_margin = margin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_size_resolves_to_itself() {
        for size in PageSize::NAMED {
            assert_eq!(resolve_page_size(size.name(), 0, 0), size);
        }
    }

    #[test]
    fn unknown_names_fall_back_to_a4() {
        for name in ["", "a3", "A11", "Letter", "custom", " A4", "B5"] {
            assert_eq!(resolve_page_size(name, 100, 200), PageSize::A4, "{name:?}");
        }
    }

    #[test]
    fn custom_dimensions_pass_through_unclamped() {
        assert_eq!(
            resolve_page_size("CUSTOM", 0, -40),
            PageSize::Custom { width: 0, height: -40 }
        );
    }

    #[test]
    fn custom_disables_auto_resize() {
        let settings = PdfSettings {
            page_size: "CUSTOM".into(),
            page_width: 300,
            page_height: 500,
            ..PdfSettings::default()
        };
        let g = resolve(None, &settings);
        assert_eq!(g.page_size, PageSize::Custom { width: 300, height: 500 });
        assert!(!g.auto_resize_width);

        let mut doc = DocumentOptions::default();
        g.apply_to(&mut doc);
        assert!(!doc.auto_resize_pdf_page_width);
    }

    #[test]
    fn named_size_keeps_auto_resize() {
        let g = resolve(None, &PdfSettings::default());
        assert_eq!(g.page_size, PageSize::A4);
        assert!(g.auto_resize_width);
    }

    #[test]
    fn request_orientation_beats_settings() {
        let settings = PdfSettings {
            orientation: Orientation::Landscape,
            ..PdfSettings::default()
        };
        assert_eq!(resolve(None, &settings).orientation, Orientation::Landscape);
        assert_eq!(
            resolve(Some(Orientation::Portrait), &settings).orientation,
            Orientation::Portrait
        );
    }

    #[test]
    fn margins_apply_to_all_sides() {
        let settings = PdfSettings {
            margins: 10,
            page_size: "A3".into(),
            ..PdfSettings::default()
        };
        let mut doc = DocumentOptions::default();
        resolve(Some(Orientation::Landscape), &settings).apply_to(&mut doc);

        assert_eq!(doc.pdf_page_size, PageSize::A3);
        assert_eq!(doc.pdf_page_orientation, PdfPageOrientation::Landscape);
        for m in [doc.top_margin, doc.bottom_margin, doc.left_margin, doc.right_margin] {
            assert_eq!(m, 10.0);
        }
    }
}
