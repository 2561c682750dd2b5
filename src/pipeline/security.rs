//! Document permissions and the owner secret.
//!
//! A PDF's owner password guards its permission flags. Leaving it empty
//! would let anyone lift the restrictions, so a blank `pdf_password` is
//! replaced by a fresh random secret on every request. A configured secret
//! is run through placeholder expansion once, letting operators derive it
//! from per-render values (`{customer}-{year}`).

use crate::error::HtmlPdfError;
use crate::options::SecurityOptions;
use crate::services::Replacements;
use crate::settings::PdfSettings;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use std::fmt;
use tracing::{debug, warn};

/// Random bytes per generated secret (24 base64 characters).
const SECRET_BYTES: usize = 18;

/// Resolved permissions and owner secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityProfile {
    pub can_edit_content: bool,
    pub can_copy_content: bool,
    pub owner_password: String,
    /// `true` when the secret was generated rather than configured.
    pub generated: bool,
}

impl fmt::Debug for SecurityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityProfile")
            .field("can_edit_content", &self.can_edit_content)
            .field("can_copy_content", &self.can_copy_content)
            .field("owner_password", &"<redacted>")
            .field("generated", &self.generated)
            .finish()
    }
}

/// A new URL-safe secret from the thread-local CSPRNG.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Resolve the security profile.
///
/// Placeholder expansion errors are fatal. An expansion that yields a blank
/// string falls back to a generated secret.
pub async fn resolve(
    settings: &PdfSettings,
    replacements: &dyn Replacements,
) -> Result<SecurityProfile, HtmlPdfError> {
    let (owner_password, generated) = if settings.password.trim().is_empty() {
        debug!("No owner password configured; generating one");
        (generate_secret(), true)
    } else {
        let expanded = replacements.expand(&settings.password).await?;
        if expanded.trim().is_empty() {
            warn!("Owner password expanded to an empty string; generating one");
            (generate_secret(), true)
        } else {
            (expanded, false)
        }
    };

    Ok(SecurityProfile {
        can_edit_content: settings.can_edit_content,
        can_copy_content: settings.can_copy_content,
        owner_password,
        generated,
    })
}

impl SecurityProfile {
    /// Write the profile onto the engine's security options.
    pub fn apply_to(&self, security: &mut SecurityOptions) {
        security.can_edit_content = self.can_edit_content;
        security.can_copy_content = self.can_copy_content;
        security.owner_password = self.owner_password.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MapReplacements, NoopReplacements};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReplacements {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Replacements for CountingReplacements {
        async fn expand(&self, input: &str) -> Result<String, HtmlPdfError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("expanded:{input}"))
        }
    }

    struct FailingReplacements;

    #[async_trait]
    impl Replacements for FailingReplacements {
        async fn expand(&self, _input: &str) -> Result<String, HtmlPdfError> {
            Err(HtmlPdfError::ReplacementFailed("template store offline".into()))
        }
    }

    #[test]
    fn generated_secrets_are_unique_and_non_blank() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 24);
        assert!(!a.trim().is_empty());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn blank_password_generates_without_expansion() {
        let counting = CountingReplacements {
            calls: AtomicUsize::new(0),
        };
        let settings = PdfSettings {
            password: "   ".into(),
            ..PdfSettings::default()
        };

        let first = resolve(&settings, &counting).await.unwrap();
        let second = resolve(&settings, &counting).await.unwrap();

        assert!(first.generated);
        assert!(!first.owner_password.is_empty());
        assert_ne!(first.owner_password, second.owner_password);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn configured_password_is_expanded_exactly_once() {
        let counting = CountingReplacements {
            calls: AtomicUsize::new(0),
        };
        let settings = PdfSettings {
            password: "{tenant}-owner".into(),
            ..PdfSettings::default()
        };

        let profile = resolve(&settings, &counting).await.unwrap();
        assert_eq!(profile.owner_password, "expanded:{tenant}-owner");
        assert!(!profile.generated);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expansion_to_blank_falls_back_to_generated() {
        let replacements = MapReplacements::new().with("secret", "");
        let settings = PdfSettings {
            password: "{secret}".into(),
            ..PdfSettings::default()
        };
        let profile = resolve(&settings, &replacements).await.unwrap();
        assert!(profile.generated);
        assert!(!profile.owner_password.is_empty());
    }

    #[tokio::test]
    async fn expansion_failure_is_fatal() {
        let settings = PdfSettings {
            password: "{tenant}".into(),
            ..PdfSettings::default()
        };
        let err = resolve(&settings, &FailingReplacements).await.unwrap_err();
        assert!(matches!(err, HtmlPdfError::ReplacementFailed(_)));
    }

    #[tokio::test]
    async fn permission_flags_follow_settings() {
        let settings = PdfSettings {
            can_edit_content: true,
            can_copy_content: false,
            password: "fixed".into(),
            ..PdfSettings::default()
        };
        let profile = resolve(&settings, &NoopReplacements).await.unwrap();

        let mut security = SecurityOptions::default();
        profile.apply_to(&mut security);
        assert!(security.can_edit_content);
        assert!(!security.can_copy_content);
        assert_eq!(security.owner_password, "fixed");
        assert!(!format!("{profile:?}").contains("fixed"));
    }
}
