//! # htmlpdf-resolver
//!
//! Turn an HTML document plus operator settings into a fully configured
//! HTML-to-PDF engine invocation.
//!
//! ## Why this crate?
//!
//! An HTML-to-PDF engine exposes dozens of knobs: page size, margins,
//! orientation, header/footer templates, permissions, owner passwords,
//! viewport size. In a hosted product those knobs come from three places at
//! once: operator settings in a key/value store, the caller's request, and
//! free-form `Key:Value` overrides. This crate resolves them in one
//! well-defined order, fails fast on bad overrides before the engine is ever
//! started, and never renders a document without an owner secret.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest + SettingsStore
//!  │
//!  ├─ 1. Settings   17 keys read concurrently, leniently coerced
//!  ├─ 2. Geometry   A0–A10 / CUSTOM size, orientation, margins
//!  ├─ 3. Security   permissions + owner secret (generated if blank)
//!  ├─ 4. Styles     background + break-control CSS prepended to the HTML
//!  ├─ 5. Overrides  `Key:Value;…` applied to converter then document options
//!  └─ 6. Render     engine call on the blocking pool → application/pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use htmlpdf_resolver::{ConversionRequest, EngineConfig, HtmlToPdfConverter, MapSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::builder().license_key("LICENSE").build()?;
//!     let settings = MapSettings::new()
//!         .with("pdf_pagesize", "A3")
//!         .with("pdf_margins", "10");
//!
//!     // Loader found via HTMLPDF_LOADER_PATH or next to the executable
//!     let converter = HtmlToPdfConverter::with_process_engine(config)?
//!         .with_settings(Arc::new(settings));
//!
//!     let request = ConversionRequest::new("<h1>Invoice</h1>", "invoice")
//!         .document_options("ConversionDelay:5;FitWidth:false");
//!     let pdf = converter.convert(&request).await?;
//!     std::fs::write(&pdf.file_name, &pdf.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `htmlpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! htmlpdf-resolver = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod request;
pub mod services;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EngineConfig, EngineConfigBuilder};
pub use convert::{HtmlToPdfConverter, PreparedConversion};
pub use error::{CoercionError, HtmlPdfError};
pub use options::{ConverterOptions, DocumentOptions, PageSize, PdfPageOrientation, SecurityOptions};
pub use output::{ensure_pdf_file_name, RenderResult, PDF_MIME_TYPE};
pub use pipeline::overlay::OverrideSet;
pub use pipeline::render::{ProcessEngine, RenderEngine};
pub use request::{ConversionRequest, Orientation};
pub use services::{
    BackgroundImages, MapReplacements, NoBackgrounds, NoContext, NoopReplacements, Replacements,
    RequestContext, StaticBackground, StaticContext,
};
pub use settings::{MapSettings, NoopSettings, PdfSettings, SettingsStore};
