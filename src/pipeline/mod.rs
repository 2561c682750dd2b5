//! Pipeline stages for resolving one HTML-to-PDF conversion.
//!
//! Each submodule implements one resolution step and can be tested without
//! an engine. [`crate::HtmlToPdfConverter`] runs them in order.
//!
//! ## Data Flow
//!
//! ```text
//! settings ──▶ geometry ──▶ security ──▶ styles ──▶ overlay ──▶ render
//! (store)      (size/margins) (secret)   (CSS)      (overrides)  (engine)
//! ```
//!
//! 1. [`geometry`]: page size, orientation, margins, auto-resize
//! 2. [`security`]: permission flags and the owner secret, generated when
//!    none is configured
//! 3. [`styles`]: break-control and background CSS prepended to the HTML
//! 4. [`overlay`]: caller-supplied `Key:Value` overrides, applied last so
//!    they win over everything derived from settings
//! 5. [`render`]: the engine call; runs in `spawn_blocking` because
//!    engines block for seconds per document

pub mod geometry;
pub mod overlay;
pub mod render;
pub mod security;
pub mod styles;
