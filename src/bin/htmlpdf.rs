//! CLI binary for htmlpdf-resolver.
//!
//! A thin shim over the library crate: settings come from a JSON file and
//! `--set` pairs, the request from flags, and the PDF goes to a file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use htmlpdf_resolver::{
    ConversionRequest, ConverterOptions, EngineConfig, HtmlPdfError, HtmlToPdfConverter,
    MapSettings, Orientation, RenderEngine, StaticContext,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render with default settings (writes report.pdf)
  htmlpdf report.html

  # Operator settings from a file, one of them overridden
  htmlpdf --settings pdf-settings.json --set pdf_margins=20 report.html

  # Landscape A3 with a header and engine overrides
  htmlpdf --set pdf_pagesize=A3 --orientation landscape \
          --header '<b>Q3</b>' --options 'ConversionDelay:5;FitWidth:false' report.html

  # HTML from stdin, PDF to stdout
  cat report.html | htmlpdf - -o - > report.pdf

  # Show the resolved engine options without rendering
  htmlpdf --dry-run --settings pdf-settings.json report.html

SETTINGS KEYS:
  pdf_orientation          Portrait | Landscape
  pdf_pagesize             A0 … A10 | CUSTOM        (default A4)
  pdf_pagesize_width/height  points, used with CUSTOM
  pdf_margins              points, all four sides
  pdf_html_viewer_width/height  pixels, applied when > 0
  pdf_avoid_text_break     true | false             (default false)
  pdf_avoid_image_break    true | false             (default true)
  pdf_header_show / pdf_footer_show / pdf_header_text / pdf_footer_text
  pdf_can_edit_content     (default false)
  pdf_can_copy_content     (default true)
  pdf_password             owner secret; random when blank
  pdf_baseurl_override     base URL for relative links

ENVIRONMENT:
  HTMLPDF_LOADER_PATH      Loader executable location
  HTMLPDF_LICENSE_KEY      Engine license key
  RUST_LOG                 Log filter (overrides -v/-q)
"#;

#[derive(Parser, Debug)]
#[command(
    name = "htmlpdf",
    version,
    about = "Render HTML to PDF with settings-driven engine options",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTML file to render, or `-` for stdin.
    input: PathBuf,

    /// Output path; `-` writes to stdout. Default: the sanitized name.
    #[arg(short, long, env = "HTMLPDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Suggested document name. Default: the input file stem.
    #[arg(long)]
    name: Option<String>,

    /// JSON object of settings (`{"pdf_pagesize": "A3", …}`).
    #[arg(long, env = "HTMLPDF_SETTINGS")]
    settings: Option<PathBuf>,

    /// Override one setting, `key=value`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Page orientation; defaults to the `pdf_orientation` setting.
    #[arg(long, value_parser = parse_orientation)]
    orientation: Option<Orientation>,

    /// Header HTML; defaults to `pdf_header_text`.
    #[arg(long)]
    header: Option<String>,

    /// Footer HTML; defaults to `pdf_footer_text`.
    #[arg(long)]
    footer: Option<String>,

    /// Engine overrides, `Key:Value;Key:Value`.
    #[arg(long = "options", value_name = "OVERRIDES")]
    document_options: Option<String>,

    /// Base URL for relative links (a `pdf_baseurl_override` setting wins).
    #[arg(long, env = "HTMLPDF_BASE_URL")]
    base_url: Option<String>,

    /// Full-page background image URL.
    #[arg(long)]
    background_url: Option<String>,

    /// Loader executable.
    #[arg(long, env = "HTMLPDF_LOADER_PATH")]
    loader: Option<PathBuf>,

    /// Engine license key.
    #[arg(long, env = "HTMLPDF_LICENSE_KEY", hide_env_values = true)]
    license_key: Option<String>,

    /// Seconds to wait after page load before converting.
    #[arg(long, env = "HTMLPDF_CONVERSION_DELAY", default_value_t = 2)]
    conversion_delay: u32,

    /// Print the resolved engine options as JSON instead of rendering.
    #[arg(long)]
    dry_run: bool,

    /// Debug logging.
    #[arg(short, long, env = "HTMLPDF_VERBOSE")]
    verbose: bool,

    /// Errors only; no spinner or summary.
    #[arg(short, long, env = "HTMLPDF_QUIET")]
    quiet: bool,
}

fn parse_orientation(s: &str) -> Result<Orientation, String> {
    s.parse::<Orientation>().map_err(|e| e.to_string())
}

/// Stands in for the engine under `--dry-run`, so no loader is required.
struct NoEngine;

impl RenderEngine for NoEngine {
    fn convert_html(
        &self,
        _html: &str,
        _base_url: Option<&str>,
        _options: &ConverterOptions,
    ) -> Result<Vec<u8>, HtmlPdfError> {
        Err(HtmlPdfError::EngineUnavailable("dry run".into()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DryRunReport<'a> {
    file_name: &'a str,
    base_url: Option<&'a str>,
    applied_overrides: &'a [&'static str],
    owner_password_generated: bool,
    options: ConverterOptions,
    html: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.verbose && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build converter ──────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let settings = load_settings(&cli).await?;

    let mut converter = if cli.dry_run {
        HtmlToPdfConverter::new(config, Arc::new(NoEngine))
    } else {
        HtmlToPdfConverter::with_process_engine(config).context("HTML engine unavailable")?
    };
    converter = converter.with_settings(Arc::new(settings));
    if let Some(ref url) = cli.base_url {
        converter = converter.with_context(Arc::new(StaticContext {
            base_url: url.clone(),
        }));
    }

    let request = build_request(&cli).await?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let prepared = converter
            .prepare(&request)
            .await
            .context("Failed to resolve options")?;
        let report = DryRunReport {
            file_name: &prepared.file_name,
            base_url: prepared.base_url.as_deref(),
            applied_overrides: &prepared.applied_overrides,
            owner_password_generated: prepared.security.generated,
            options: prepared.options.redacted(),
            html: &prepared.html,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise options")?
        );
        return Ok(());
    }

    // ── Render ───────────────────────────────────────────────────────────
    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Rendering");
        bar.set_message(request.file_name.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let to_stdout = cli.output.as_deref() == Some(Path::new("-"));
    let (result, written_to) = if to_stdout {
        let result = converter.convert(&request).await.context("Conversion failed")?;
        io::stdout()
            .lock()
            .write_all(&result.bytes)
            .context("Failed to write to stdout")?;
        (result, None)
    } else {
        let path = match cli.output {
            Some(ref p) => p.clone(),
            None => PathBuf::from(htmlpdf_resolver::ensure_pdf_file_name(&request.file_name)),
        };
        let result = converter
            .convert_to_file(&request, &path)
            .await
            .context("Conversion failed")?;
        (result, Some(path))
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if !cli.quiet {
        match written_to {
            Some(path) => eprintln!(
                "{}  {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", result.len())),
            ),
            None => eprintln!("{}  {}", green("✔"), dim(&format!("{} bytes", result.len()))),
        }
    }

    Ok(())
}

/// Map CLI args to `EngineConfig`.
fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut builder = EngineConfig::builder().conversion_delay(cli.conversion_delay);
    if let Some(ref key) = cli.license_key {
        builder = builder.license_key(key.clone());
    }
    if let Some(ref loader) = cli.loader {
        builder = builder.loader_path(loader.clone());
    }
    builder.build().context("Invalid configuration")
}

/// `--settings` file first, then `--set` pairs on top.
async fn load_settings(cli: &Cli) -> Result<MapSettings> {
    let mut settings = match cli.settings {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read settings from {:?}", path))?;
            MapSettings::from_json(&json)
                .with_context(|| format!("Invalid settings file {:?}", path))?
        }
        None => MapSettings::new(),
    };

    for pair in &cli.set {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("--set expects key=value, got '{pair}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("--set has an empty key: '{pair}'");
        }
        settings.insert(key, value.trim());
    }
    Ok(settings)
}

async fn build_request(cli: &Cli) -> Result<ConversionRequest> {
    let from_stdin = cli.input.as_os_str() == "-";
    let html = if from_stdin {
        let mut html = String::new();
        io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read HTML from stdin")?;
        html
    } else {
        tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read {:?}", cli.input))?
    };

    let name = match cli.name {
        Some(ref n) => n.clone(),
        None if from_stdin => String::new(),
        None => cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let mut request = ConversionRequest::new(html, name);
    request.orientation = cli.orientation;
    request.header = cli.header.clone();
    request.footer = cli.footer.clone();
    request.document_options = cli.document_options.clone();
    request.background_url = cli.background_url.clone();
    Ok(request)
}
