//! Conversion output types.

use serde::Serialize;
use std::fmt;

/// MIME type of every rendered document.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Used when the requested file name sanitizes to nothing.
pub const DEFAULT_FILE_STEM: &str = "document";

/// A rendered document ready to hand to the caller.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// Sanitized download name, always ending in `.pdf`.
    pub file_name: String,
}

impl RenderResult {
    pub fn pdf(bytes: Vec<u8>, requested_name: &str) -> Self {
        Self {
            bytes,
            mime_type: PDF_MIME_TYPE,
            file_name: ensure_pdf_file_name(requested_name),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for RenderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResult")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Make `name` safe to offer as a download name.
///
/// Path separators, characters Windows forbids in file names and control
/// characters are removed; leading/trailing whitespace and dots are
/// trimmed; a blank result becomes `document`; `.pdf` is appended unless
/// already present (any case).
pub fn ensure_pdf_file_name(name: &str) -> String {
    const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !FORBIDDEN.contains(c))
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();

    let stem = if cleaned.is_empty() { DEFAULT_FILE_STEM } else { cleaned };

    if stem.to_ascii_lowercase().ends_with(".pdf") {
        stem.to_string()
    } else {
        format!("{stem}.pdf")
    }
}
