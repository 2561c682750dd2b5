//! The conversion entry point.
//!
//! [`HtmlToPdfConverter`] owns the engine and the collaborators and runs the
//! pipeline for each request:
//!
//! ```text
//! load settings → geometry → security → background → styles
//!   → viewer/header/footer → engine config → overrides → base URL → render
//! ```
//!
//! Everything up to the engine call is exposed separately as
//! [`HtmlToPdfConverter::prepare`], so callers (and the CLI's `--dry-run`)
//! can inspect exactly what would be handed to the engine.

use crate::config::EngineConfig;
use crate::error::HtmlPdfError;
use crate::options::ConverterOptions;
use crate::output::{ensure_pdf_file_name, RenderResult};
use crate::pipeline::geometry::{self, ResolvedGeometry};
use crate::pipeline::overlay::{self, OverrideSet};
use crate::pipeline::render::{self, ProcessEngine, RenderEngine};
use crate::pipeline::security::{self, SecurityProfile};
use crate::pipeline::styles;
use crate::request::{non_blank, ConversionRequest};
use crate::services::{
    BackgroundImages, NoBackgrounds, NoContext, NoopReplacements, Replacements, RequestContext,
};
use crate::settings::{NoopSettings, PdfSettings, SettingsStore};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything the engine will receive for one request.
#[derive(Debug, Clone)]
pub struct PreparedConversion {
    /// HTML with the style blocks prepended.
    pub html: String,
    pub base_url: Option<String>,
    pub options: ConverterOptions,
    /// Sanitized download name.
    pub file_name: String,
    pub geometry: ResolvedGeometry,
    pub security: SecurityProfile,
    /// Override keys that were applied, in order.
    pub applied_overrides: Vec<&'static str>,
}

/// Resolves settings and request into engine options and renders PDFs.
///
/// One converter serves many concurrent requests; it holds no per-request
/// state.
///
/// # Example
/// ```rust,no_run
/// use htmlpdf_resolver::{ConversionRequest, EngineConfig, HtmlToPdfConverter, MapSettings};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = HtmlToPdfConverter::with_process_engine(EngineConfig::default())?
///     .with_settings(Arc::new(MapSettings::new().with("pdf_pagesize", "A3")));
///
/// let request = ConversionRequest::new("<h1>Hello</h1>", "hello");
/// let pdf = converter.convert(&request).await?;
/// std::fs::write(&pdf.file_name, &pdf.bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HtmlToPdfConverter {
    config: EngineConfig,
    engine: Arc<dyn RenderEngine>,
    settings: Arc<dyn SettingsStore>,
    replacements: Arc<dyn Replacements>,
    backgrounds: Arc<dyn BackgroundImages>,
    context: Arc<dyn RequestContext>,
}

impl fmt::Debug for HtmlToPdfConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlToPdfConverter")
            .field("config", &self.config)
            .field("loader", &self.engine.loader_path())
            .finish_non_exhaustive()
    }
}

impl HtmlToPdfConverter {
    /// A converter around `engine` with no-op collaborators.
    pub fn new(config: EngineConfig, engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            config,
            engine,
            settings: Arc::new(NoopSettings),
            replacements: Arc::new(NoopReplacements),
            backgrounds: Arc::new(NoBackgrounds),
            context: Arc::new(NoContext),
        }
    }

    /// A converter driving the installed loader executable.
    ///
    /// Fails with [`HtmlPdfError::EngineUnavailable`] when the loader cannot
    /// be found or is not executable, so a broken install surfaces at
    /// start-up rather than on the first request.
    pub fn with_process_engine(config: EngineConfig) -> Result<Self, HtmlPdfError> {
        let engine = ProcessEngine::new(config.loader_path.as_deref())?;
        Ok(Self::new(config, Arc::new(engine)))
    }

    pub fn with_settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_replacements(mut self, replacements: Arc<dyn Replacements>) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn with_backgrounds(mut self, backgrounds: Arc<dyn BackgroundImages>) -> Self {
        self.backgrounds = backgrounds;
        self
    }

    pub fn with_context(mut self, context: Arc<dyn RequestContext>) -> Self {
        self.context = context;
        self
    }

    /// Resolve everything the engine needs, without rendering.
    ///
    /// # Errors
    /// * [`HtmlPdfError::SettingsUnavailable`]: the settings store failed
    /// * [`HtmlPdfError::ReplacementFailed`]: the owner secret could not be expanded
    /// * [`HtmlPdfError::BackgroundLookupFailed`]: the content store failed
    /// * [`HtmlPdfError::InvalidOverride`]: an override value did not parse
    pub async fn prepare(
        &self,
        request: &ConversionRequest,
    ) -> Result<PreparedConversion, HtmlPdfError> {
        let file_name = ensure_pdf_file_name(&request.file_name);
        debug!("Preparing {}", file_name);

        // ── Step 1: Settings ─────────────────────────────────────────────
        let settings = PdfSettings::load(self.settings.as_ref()).await?;

        let mut options = self.config.base_options();

        // ── Step 2: Geometry ─────────────────────────────────────────────
        let geometry = geometry::resolve(request.orientation, &settings);
        geometry.apply_to(&mut options.pdf_document_options);
        debug!(
            "Geometry: {} {} margins={}",
            geometry.page_size, geometry.orientation, geometry.margins
        );

        // ── Step 3: Security ─────────────────────────────────────────────
        let security = security::resolve(&settings, self.replacements.as_ref()).await?;
        security.apply_to(&mut options.pdf_security_options);

        // ── Step 4: Background + styles ──────────────────────────────────
        let background = self.lookup_background(request).await?;
        let html = styles::inject(&request.html, &settings, background.as_deref());

        // ── Step 5: Viewer, header and footer ────────────────────────────
        if settings.html_viewer_width > 0 {
            options.html_viewer_width = settings.html_viewer_width;
        }
        if settings.html_viewer_height > 0 {
            options.html_viewer_height = settings.html_viewer_height;
        }

        let document = &mut options.pdf_document_options;
        document.enable_header_footer = settings.header_footer_enabled();
        document.header_template = non_blank(request.header.as_deref())
            .or_else(|| non_blank(Some(settings.header_text.as_str())))
            .map(str::to_string);
        document.footer_template = non_blank(request.footer.as_deref())
            .or_else(|| non_blank(Some(settings.footer_text.as_str())))
            .map(str::to_string);

        // ── Step 6: Engine location ──────────────────────────────────────
        options.html_loader_file_path = self
            .engine
            .loader_path()
            .or(self.config.loader_path.as_deref())
            .map(|p| p.display().to_string());

        // ── Step 7: Overrides ────────────────────────────────────────────
        let overrides = OverrideSet::parse(request.document_options.as_deref().unwrap_or(""));
        let applied_overrides = overlay::apply_to_converter(&mut options, &overrides)?;
        if !geometry.auto_resize_width && options.pdf_document_options.auto_resize_pdf_page_width {
            warn!("Ignoring AutoResizePdfPageWidth override for custom page size");
            options.pdf_document_options.auto_resize_pdf_page_width = false;
        }

        // ── Step 8: Base URL ─────────────────────────────────────────────
        let base_url = settings
            .baseurl_override
            .clone()
            .or_else(|| self.context.base_url())
            .filter(|url| !url.trim().is_empty());

        Ok(PreparedConversion {
            html,
            base_url,
            options,
            file_name,
            geometry,
            security,
            applied_overrides,
        })
    }

    async fn lookup_background(
        &self,
        request: &ConversionRequest,
    ) -> Result<Option<String>, HtmlPdfError> {
        if let Some(url) = non_blank(request.background_url.as_deref()) {
            return Ok(Some(url.to_string()));
        }
        let item_id = match request.item_id {
            Some(id) if id > 0 => id,
            _ => return Ok(None),
        };
        let Some(property) = non_blank(request.background_property_name.as_deref()) else {
            return Ok(None);
        };

        let url = self.backgrounds.lookup(item_id, property).await?;
        debug!("Background for item {} ({}): {:?}", item_id, property, url);
        Ok(url)
    }

    /// Convert a request to a PDF.
    ///
    /// Nothing reaches the engine unless every resolution step succeeded.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<RenderResult, HtmlPdfError> {
        let start = Instant::now();
        let prepared = self.prepare(request).await?;
        info!(
            "Rendering {} ({} bytes of HTML, {} overrides)",
            prepared.file_name,
            prepared.html.len(),
            prepared.applied_overrides.len()
        );

        let bytes = render::render(
            Arc::clone(&self.engine),
            prepared.html,
            prepared.base_url,
            prepared.options,
        )
        .await?;

        info!(
            "Rendered {} ({} bytes) in {}ms",
            prepared.file_name,
            bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(RenderResult::pdf(bytes, &prepared.file_name))
    }

    /// Convert and write the PDF to `output_path`.
    ///
    /// The file is written to a sibling temporary and renamed into place, so
    /// readers never observe a half-written PDF.
    pub async fn convert_to_file(
        &self,
        request: &ConversionRequest,
        output_path: impl AsRef<Path>,
    ) -> Result<RenderResult, HtmlPdfError> {
        let result = self.convert(request).await?;
        let path = output_path.as_ref();
        let write_err = |e: std::io::Error| HtmlPdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        let written = match tokio::fs::write(&tmp_path, &result.bytes).await {
            Ok(()) => tokio::fs::rename(&tmp_path, path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        info!("Wrote {}", path.display());
        Ok(result)
    }

    /// Synchronous wrapper around [`HtmlToPdfConverter::convert`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from
    /// inside an async context.
    pub fn convert_sync(&self, request: &ConversionRequest) -> Result<RenderResult, HtmlPdfError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| HtmlPdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert(request))
    }
}
