//! Process-level engine configuration.
//!
//! Two layers of configuration exist:
//!
//! * [`EngineConfig`] (this module) is fixed for the lifetime of a
//!   [`crate::HtmlToPdfConverter`] and holds the license key, loader
//!   location and engine defaults. Built once via [`EngineConfigBuilder`].
//! * Per-request settings are read from the settings store on every
//!   conversion and resolved into [`crate::settings::PdfSettings`].

use crate::error::HtmlPdfError;
use crate::options::ConverterOptions;
use std::fmt;
use std::path::PathBuf;

/// Configuration shared by every conversion.
///
/// # Example
/// ```rust
/// use htmlpdf_resolver::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .license_key("LICENSE-KEY")
///     .loader_path("/app/htmlpdf_loadhtml")
///     .conversion_delay(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_options().conversion_delay, 3);
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    /// Engine license key. Optional; unlicensed engines may watermark output.
    pub license_key: Option<String>,

    /// Explicit location of the engine's loader executable.
    ///
    /// Containers often install the application somewhere the engine's own
    /// lookup does not search (e.g. `/app`). When `None` the loader is
    /// searched for via `HTMLPDF_LOADER_PATH` and the default locations.
    pub loader_path: Option<PathBuf>,

    /// Seconds to wait after page load before converting. Default: 2.
    ///
    /// Lets client-side scripts finish before the page is captured.
    /// Requests may raise or lower it with `ConversionDelay:N`.
    pub conversion_delay: u32,

    /// Seconds before a page load is abandoned. Default: 60.
    pub navigation_timeout: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            license_key: None,
            loader_path: None,
            conversion_delay: 2,
            navigation_timeout: 60,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("license_key", &self.license_key.as_ref().map(|_| "<redacted>"))
            .field("loader_path", &self.loader_path)
            .field("conversion_delay", &self.conversion_delay)
            .field("navigation_timeout", &self.navigation_timeout)
            .finish()
    }
}

impl EngineConfig {
    /// Create a new builder for `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Engine options before any per-request setting is applied.
    pub fn base_options(&self) -> ConverterOptions {
        ConverterOptions {
            license_key: self.license_key.clone(),
            conversion_delay: self.conversion_delay,
            navigation_timeout: self.navigation_timeout,
            ..ConverterOptions::default()
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn license_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.license_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn loader_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.loader_path = Some(path.into());
        self
    }

    pub fn conversion_delay(mut self, secs: u32) -> Self {
        self.config.conversion_delay = secs;
        self
    }

    pub fn navigation_timeout(mut self, secs: u32) -> Self {
        self.config.navigation_timeout = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig, HtmlPdfError> {
        let c = &self.config;
        if c.navigation_timeout == 0 {
            return Err(HtmlPdfError::InvalidConfig(
                "Navigation timeout must be ≥ 1 second".into(),
            ));
        }
        if c.conversion_delay >= c.navigation_timeout {
            return Err(HtmlPdfError::InvalidConfig(format!(
                "Conversion delay ({}s) must be shorter than the navigation timeout ({}s)",
                c.conversion_delay, c.navigation_timeout
            )));
        }
        if let Some(ref path) = c.loader_path {
            if path.as_os_str().is_empty() {
                return Err(HtmlPdfError::InvalidConfig("Loader path is empty".into()));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.conversion_delay, 2);
        assert!(config.license_key.is_none());
        let options = config.base_options();
        assert_eq!(options.conversion_delay, 2);
        assert_eq!(options.navigation_timeout, 60);
    }

    #[test]
    fn blank_license_key_is_none() {
        let config = EngineConfig::builder().license_key("  ").build().unwrap();
        assert!(config.license_key.is_none());
    }

    #[test]
    fn license_key_flows_into_options_but_not_debug() {
        let config = EngineConfig::builder().license_key("LIC-42").build().unwrap();
        assert_eq!(config.base_options().license_key.as_deref(), Some("LIC-42"));
        assert!(!format!("{config:?}").contains("LIC-42"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = EngineConfig::builder()
            .navigation_timeout(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, HtmlPdfError::InvalidConfig(_)));
    }

    #[test]
    fn delay_must_be_below_timeout() {
        assert!(EngineConfig::builder()
            .conversion_delay(30)
            .navigation_timeout(30)
            .build()
            .is_err());
        assert!(EngineConfig::builder()
            .conversion_delay(5)
            .navigation_timeout(30)
            .build()
            .is_ok());
    }

    #[test]
    fn empty_loader_path_is_rejected() {
        assert!(EngineConfig::builder().loader_path("").build().is_err());
    }
}
