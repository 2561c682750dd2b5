//! Collaborator interfaces used by the converter, with default
//! implementations.
//!
//! Each collaborator is optional in practice: a CLI run has no HTTP context
//! and usually no content store for background images. Rather than passing
//! `Option`s around, every trait comes with a no-op implementation that
//! [`crate::HtmlToPdfConverter`] uses unless told otherwise.
//!
//! All traits require `Send + Sync`: one converter may serve concurrent
//! requests, and implementations must tolerate concurrent reads.

use crate::error::HtmlPdfError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

// ── Placeholder expansion ────────────────────────────────────────────────

/// Expands placeholders such as `{year}` inside configured strings.
#[async_trait]
pub trait Replacements: Send + Sync {
    async fn expand(&self, input: &str) -> Result<String, HtmlPdfError>;
}

/// Returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReplacements;

#[async_trait]
impl Replacements for NoopReplacements {
    async fn expand(&self, input: &str) -> Result<String, HtmlPdfError> {
        Ok(input.to_string())
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("valid placeholder regex"));

/// Expands `{name}` from a fixed map. Unknown placeholders are left as-is.
#[derive(Debug, Default, Clone)]
pub struct MapReplacements {
    values: HashMap<String, String>,
}

impl MapReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl Replacements for MapReplacements {
    async fn expand(&self, input: &str) -> Result<String, HtmlPdfError> {
        let expanded = PLACEHOLDER.replace_all(input, |caps: &Captures<'_>| {
            match self.values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        });
        Ok(expanded.into_owned())
    }
}

// ── Background images ────────────────────────────────────────────────────

/// Looks up the background image URL stored on a content item.
#[async_trait]
pub trait BackgroundImages: Send + Sync {
    /// `Ok(None)` (or a blank URL) means the item has no background.
    async fn lookup(&self, item_id: u64, property_name: &str)
        -> Result<Option<String>, HtmlPdfError>;
}

/// No content store: no item ever has a background.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackgrounds;

#[async_trait]
impl BackgroundImages for NoBackgrounds {
    async fn lookup(&self, _item_id: u64, _property_name: &str)
        -> Result<Option<String>, HtmlPdfError> {
        Ok(None)
    }
}

/// Every item resolves to the same image URL.
#[derive(Debug, Clone)]
pub struct StaticBackground {
    pub url: String,
}

#[async_trait]
impl BackgroundImages for StaticBackground {
    async fn lookup(&self, _item_id: u64, _property_name: &str)
        -> Result<Option<String>, HtmlPdfError> {
        Ok(Some(self.url.clone()))
    }
}

// ── Request context ──────────────────────────────────────────────────────

/// Ambient information about the request being served.
pub trait RequestContext: Send + Sync {
    /// Base URL that relative links in the HTML resolve against.
    fn base_url(&self) -> Option<String>;
}

/// Outside a web request: no base URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContext;

impl RequestContext for NoContext {
    fn base_url(&self) -> Option<String> {
        None
    }
}

/// A fixed base URL, e.g. taken from the CLI.
#[derive(Debug, Clone)]
pub struct StaticContext {
    pub base_url: String,
}

impl RequestContext for StaticContext {
    fn base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
