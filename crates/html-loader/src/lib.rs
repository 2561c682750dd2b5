//! # html-loader
//!
//! Locate and validate the auxiliary HTML loader executable that the
//! HTML-to-PDF engine spawns to load and lay out pages.
//!
//! Engines ship this helper next to their shared library, but the default
//! lookup is not reliable on every host (containers in particular copy the
//! application into a fixed directory such as `/app`). Instead of a
//! hard-coded per-OS branch, the location is resolved from configuration.
//!
//! ## Resolution order
//!
//! 1. An explicitly configured path (e.g. from `EngineConfig`). When set it
//!    is authoritative: a missing file is an error, never a fallback.
//! 2. The `HTMLPDF_LOADER_PATH` environment variable.
//! 3. The directory containing the current executable.
//! 4. The user executable directory (`~/.local/bin` on Linux).
//!
//! The first existing candidate is then validated: it must be a regular file
//! and, on Unix, carry an execute bit.
//!
//! ```rust,no_run
//! use html_loader::locate_loader;
//!
//! let loader = locate_loader(None).expect("loader not installed");
//! println!("using {}", loader.display());
//! ```
//!
//! ## Platform support
//!
//! | OS      | Loader file name          |
//! |---------|---------------------------|
//! | macOS   | `htmlpdf_loadhtml`        |
//! | Linux   | `htmlpdf_loadhtml`        |
//! | Windows | `htmlpdf_loadhtml.exe`    |

use std::path::{Path, PathBuf};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that points at an existing loader executable.
pub const LOADER_ENV_VAR: &str = "HTMLPDF_LOADER_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while locating the loader executable.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The current OS has no known loader build.
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    /// The explicitly configured path does not exist.
    #[error("Configured loader '{path}' does not exist")]
    ConfiguredMissing { path: PathBuf },

    /// No candidate location contained the loader.
    #[error("HTML loader not found; searched: {}", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// The path exists but is a directory or special file.
    #[error("HTML loader '{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    /// The file exists but cannot be executed.
    #[error("HTML loader '{path}' is not executable\nTry: chmod +x {path:?}")]
    NotExecutable { path: PathBuf },

    /// Metadata could not be read.
    #[error("Failed to inspect '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<no candidates>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// File name of the loader on the current platform.
pub fn loader_file_name() -> Result<&'static str, LoaderError> {
    match std::env::consts::OS {
        "macos" | "linux" => Ok("htmlpdf_loadhtml"),
        "windows" => Ok("htmlpdf_loadhtml.exe"),
        os => Err(LoaderError::UnsupportedPlatform { os: os.to_string() }),
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Every location that will be searched, in priority order.
///
/// The configured path, when present, is the only candidate.
pub fn candidate_paths(configured: Option<&Path>) -> Result<Vec<PathBuf>, LoaderError> {
    if let Some(path) = configured {
        return Ok(vec![path.to_path_buf()]);
    }

    let env_path = std::env::var(LOADER_ENV_VAR)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let mut search_dirs = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        search_dirs.push(dir);
    }
    if let Some(dir) = dirs::executable_dir() {
        search_dirs.push(dir);
    }

    search_order(env_path, loader_file_name(), &search_dirs)
}

/// The environment path first, then `file_name` in each search directory.
///
/// Without a known file name only the environment path remains; the
/// platform error surfaces when nothing is left to try.
fn search_order(
    env_path: Option<PathBuf>,
    file_name: Result<&'static str, LoaderError>,
    search_dirs: &[PathBuf],
) -> Result<Vec<PathBuf>, LoaderError> {
    let mut candidates: Vec<PathBuf> = env_path.into_iter().collect();

    match file_name {
        Ok(name) => candidates.extend(search_dirs.iter().map(|dir| dir.join(name))),
        Err(e) if candidates.is_empty() => return Err(e),
        Err(_) => {}
    }

    Ok(candidates)
}

/// Resolve the loader executable and validate it.
pub fn locate_loader(configured: Option<&Path>) -> Result<PathBuf, LoaderError> {
    let candidates = candidate_paths(configured)?;

    if let Some(path) = configured {
        if !path.exists() {
            return Err(LoaderError::ConfiguredMissing {
                path: path.to_path_buf(),
            });
        }
        return validate_loader(path);
    }

    match candidates.iter().find(|p| p.exists()) {
        Some(found) => validate_loader(found),
        None => Err(LoaderError::NotFound {
            searched: candidates,
        }),
    }
}

/// Check that `path` is a regular, executable file.
pub fn validate_loader(path: &Path) -> Result<PathBuf, LoaderError> {
    let metadata = std::fs::metadata(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if !metadata.is_file() {
        return Err(LoaderError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    if !is_executable(&metadata) {
        return Err(LoaderError::NotExecutable {
            path: path.to_path_buf(),
        });
    }

    Ok(path.to_path_buf())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
