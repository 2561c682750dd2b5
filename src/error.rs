//! Error types for the htmlpdf-resolver library.
//!
//! Two error types reflect two levels of detail:
//!
//! * [`HtmlPdfError`]: **Fatal**: the conversion cannot proceed at all
//!   (engine missing, malformed override, templating failure, engine crash).
//!   Returned as `Err(HtmlPdfError)` from every public entry point.
//!
//! * [`CoercionError`]: a single override value that could not be converted
//!   to the declared type of the option it targets. It always surfaces as
//!   [`HtmlPdfError::InvalidOverride`]; it exists separately so the overlay
//!   registry can report failures without knowing which request it serves.
//!
//! Lenient parsing of the settings store (non-numeric integers become `0`,
//! anything but `"true"` becomes `false`) never produces an error; see
//! [`crate::settings`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the htmlpdf-resolver library.
#[derive(Debug, Error)]
pub enum HtmlPdfError {
    // ── Engine errors ─────────────────────────────────────────────────────
    /// The rendering engine or its loader executable is not installed.
    #[error(
        "HTML-to-PDF engine is unavailable: {0}\n\n\
The engine needs its auxiliary loader executable. You can:\n\
  • Set HTMLPDF_LOADER_PATH=/path/to/htmlpdf_loadhtml.\n\
  • Configure the path explicitly with EngineConfig::builder().loader_path(..).\n\
  • On Linux containers, make sure the file is executable (chmod +x).\n"
    )]
    EngineUnavailable(String),

    /// The engine ran but reported a failure.
    #[error("Rendering engine failed: {0}")]
    EngineFailed(String),

    // ── Request errors ────────────────────────────────────────────────────
    /// An orientation value outside Portrait/Landscape.
    #[error("Invalid page orientation '{value}': expected 'portrait' or 'landscape'")]
    InvalidOrientation { value: String },

    /// An override value could not be coerced to its option's type.
    #[error("Invalid document option: {0}")]
    InvalidOverride(#[from] CoercionError),

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The settings store could not be queried.
    #[error("Settings lookup for '{name}' failed: {reason}")]
    SettingsUnavailable { name: String, reason: String },

    /// The placeholder-expansion service failed.
    #[error("Placeholder expansion failed: {0}")]
    ReplacementFailed(String),

    /// The background-image lookup failed.
    #[error("Background image lookup failed for item {item_id}: {reason}")]
    BackgroundLookupFailed { item_id: u64, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<html_loader::LoaderError> for HtmlPdfError {
    fn from(e: html_loader::LoaderError) -> Self {
        HtmlPdfError::EngineUnavailable(e.to_string())
    }
}

/// A single override that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot set '{option}' to '{value}': expected {expected}")]
pub struct CoercionError {
    /// Canonical name of the targeted option, e.g. `ConversionDelay`.
    pub option: &'static str,
    /// The raw value taken from the override string.
    pub value: String,
    /// Human-readable description of the declared type.
    pub expected: &'static str,
}
