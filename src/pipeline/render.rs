//! Rendering: hand the prepared HTML and options to the engine.
//!
//! ## Why spawn_blocking?
//!
//! HTML-to-PDF engines load the page in a headless browser process and
//! block until the document is laid out, often for seconds.
//! `tokio::task::spawn_blocking` moves that wait onto the blocking thread
//! pool so the async workers keep serving settings lookups for other
//! requests in the meantime.
//!
//! The engine is a black box behind [`RenderEngine`]. [`ProcessEngine`] is
//! the bundled implementation: it runs the engine's loader executable with
//! the HTML and the serialised options in a private temporary directory.

use crate::error::HtmlPdfError;
use crate::options::ConverterOptions;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};

/// An HTML-to-PDF engine.
///
/// Implementations must be safe to call from several threads at once.
/// Calls block; the converter runs them on the blocking pool.
pub trait RenderEngine: Send + Sync {
    /// Render `html` with `options`; relative URLs resolve against `base_url`.
    fn convert_html(
        &self,
        html: &str,
        base_url: Option<&str>,
        options: &ConverterOptions,
    ) -> Result<Vec<u8>, HtmlPdfError>;

    /// Loader executable the engine uses, if it has one.
    fn loader_path(&self) -> Option<&Path> {
        None
    }
}

/// Run `engine` on the blocking pool.
pub async fn render(
    engine: Arc<dyn RenderEngine>,
    html: String,
    base_url: Option<String>,
    options: ConverterOptions,
) -> Result<Vec<u8>, HtmlPdfError> {
    tokio::task::spawn_blocking(move || engine.convert_html(&html, base_url.as_deref(), &options))
        .await
        .map_err(|e| HtmlPdfError::Internal(format!("Render task panicked: {}", e)))?
}

// ── Process-backed engine ────────────────────────────────────────────────

/// Job description written next to the HTML for the loader.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoaderJob<'a> {
    base_url: Option<&'a str>,
    options: &'a ConverterOptions,
}

/// Drives the engine's loader executable.
///
/// The loader is invoked as
/// `loader --input page.html --options job.json --output out.pdf`.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    loader: PathBuf,
}

impl ProcessEngine {
    /// Locate and validate the loader. Fails when it is not installed.
    pub fn new(configured: Option<&Path>) -> Result<Self, HtmlPdfError> {
        let loader = html_loader::locate_loader(configured)?;
        info!("Using HTML loader at {}", loader.display());
        Ok(Self { loader })
    }
}

impl RenderEngine for ProcessEngine {
    fn convert_html(
        &self,
        html: &str,
        base_url: Option<&str>,
        options: &ConverterOptions,
    ) -> Result<Vec<u8>, HtmlPdfError> {
        let dir = tempfile::tempdir()
            .map_err(|e| HtmlPdfError::Internal(format!("tempdir: {e}")))?;
        let input_path = dir.path().join("page.html");
        let job_path = dir.path().join("job.json");
        let output_path = dir.path().join("out.pdf");

        std::fs::write(&input_path, html)
            .map_err(|e| HtmlPdfError::Internal(format!("Failed to write HTML: {e}")))?;

        let job = serde_json::to_vec(&LoaderJob { base_url, options })
            .map_err(|e| HtmlPdfError::Internal(format!("Failed to serialise options: {e}")))?;
        std::fs::write(&job_path, job)
            .map_err(|e| HtmlPdfError::Internal(format!("Failed to write options: {e}")))?;

        debug!("Running {} in {}", self.loader.display(), dir.path().display());
        let output = Command::new(&self.loader)
            .arg("--input")
            .arg(&input_path)
            .arg("--options")
            .arg(&job_path)
            .arg("--output")
            .arg(&output_path)
            .current_dir(dir.path())
            .output()
            .map_err(|e| {
                HtmlPdfError::EngineUnavailable(format!(
                    "failed to start '{}': {e}",
                    self.loader.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HtmlPdfError::EngineFailed(format!(
                "loader exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(&output_path).map_err(|e| {
            HtmlPdfError::EngineFailed(format!("loader produced no output file: {e}"))
        })?;

        if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
            let mut magic = [0u8; 4];
            let n = bytes.len().min(4);
            magic[..n].copy_from_slice(&bytes[..n]);
            return Err(HtmlPdfError::EngineFailed(format!(
                "loader output is not a PDF (first bytes: {magic:?})"
            )));
        }

        Ok(bytes)
    }

    fn loader_path(&self) -> Option<&Path> {
        Some(&self.loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine(Vec<u8>);

    impl RenderEngine for FixedEngine {
        fn convert_html(
            &self,
            _html: &str,
            _base_url: Option<&str>,
            _options: &ConverterOptions,
        ) -> Result<Vec<u8>, HtmlPdfError> {
            Ok(self.0.clone())
        }
    }

    struct PanickingEngine;

    impl RenderEngine for PanickingEngine {
        fn convert_html(
            &self,
            _html: &str,
            _base_url: Option<&str>,
            _options: &ConverterOptions,
        ) -> Result<Vec<u8>, HtmlPdfError> {
            panic!("engine crashed");
        }
    }

    #[tokio::test]
    async fn render_returns_engine_bytes() {
        let engine: Arc<dyn RenderEngine> = Arc::new(FixedEngine(b"%PDF-1.7".to_vec()));
        let bytes = render(engine, "<p/>".into(), None, ConverterOptions::default())
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn engine_panic_becomes_internal_error() {
        let engine: Arc<dyn RenderEngine> = Arc::new(PanickingEngine);
        let err = render(engine, String::new(), None, ConverterOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HtmlPdfError::Internal(_)), "got: {err}");
    }

    #[test]
    fn missing_loader_fails_at_construction() {
        let err = ProcessEngine::new(Some(Path::new("/no/such/htmlpdf_loadhtml"))).unwrap_err();
        assert!(matches!(err, HtmlPdfError::EngineUnavailable(_)));
    }

    #[cfg(unix)]
    fn script_engine(body: &str) -> (tempfile::TempDir, ProcessEngine) {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("htmlpdf_loadhtml");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let engine = ProcessEngine::new(Some(&script)).unwrap();
        (dir, engine)
    }

    // Scripts are written and spawned from one test so no other test thread
    // can fork while a script file is still open for writing.
    #[cfg(unix)]
    #[test]
    fn process_engine_drives_loader_executable() {
        // $4 is the --options path, $6 the --output path.
        let (_dir, engine) = script_engine(r#"printf '%%PDF-1.7 fake' > "$6""#);
        let bytes = engine
            .convert_html("<p>x</p>", Some("https://example.com/"), &ConverterOptions::default())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(engine.loader_path().map(|p| p.ends_with("htmlpdf_loadhtml")), Some(true));

        let (_dir, engine) = script_engine(
            r#"grep -q '"ConversionDelay":9' "$4" || exit 3
printf '%%PDF' > "$6""#,
        );
        let options = ConverterOptions {
            conversion_delay: 9,
            ..ConverterOptions::default()
        };
        assert!(engine.convert_html("", None, &options).is_ok());

        let (_dir, engine) = script_engine("echo 'page load timed out' >&2; exit 2");
        let err = engine
            .convert_html("", None, &ConverterOptions::default())
            .unwrap_err();
        assert!(matches!(err, HtmlPdfError::EngineFailed(_)));
        assert!(err.to_string().contains("page load timed out"));

        let (_dir, engine) = script_engine(r#"printf 'oops' > "$6""#);
        let err = engine
            .convert_html("", None, &ConverterOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }
}
