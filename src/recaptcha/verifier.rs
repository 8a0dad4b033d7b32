//! Token verification against an assessment backend.
//!
//! The verifier turns `(token, site key)` into a [`VerificationOutcome`].
//! Only a definitive negative answer is `Invalid`; configuration problems and
//! backend failures are `Indeterminate`, which callers treat as "allow".

use crate::config::RecaptchaSettings;
use crate::core::error::{BackendError, BackendResult};
use crate::recaptcha::http::HttpAssessmentBackend;
use log::{error, info, warn};
use std::fmt;
use std::sync::Arc;

/// Result of a CAPTCHA check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The token proves a human completed the challenge.
    Valid,
    /// The token was rejected, or none was supplied.
    Invalid,
    /// Verification could not be completed.
    Indeterminate,
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationOutcome::Valid => "valid",
            VerificationOutcome::Invalid => "invalid",
            VerificationOutcome::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// Token validity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenProperties {
    /// Whether the token is valid.
    pub valid: bool,
    /// Backend-provided reason when the token is invalid.
    pub invalid_reason: Option<String>,
}

impl TokenProperties {
    /// A valid token.
    pub fn valid() -> Self {
        Self { valid: true, invalid_reason: None }
    }

    /// An invalid token with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            invalid_reason: Some(reason.into()),
        }
    }
}

/// Remote scoring service that assesses tokens.
pub trait AssessmentBackend: Send + Sync {
    /// Submit an assessment for `token` issued for `site_key` under `project_id`.
    fn create_assessment(&self, project_id: &str, token: &str, site_key: &str) -> BackendResult<TokenProperties>;
}

/// Capability used by the CAPTCHA step.
pub trait TokenVerifier: Send + Sync {
    /// Check a token issued for `site_key`.
    fn verify_token(&self, token: &str, site_key: &str) -> VerificationOutcome;
}

/// Verifier bound to one project identity.
///
/// Holds no per-request state. Cloning shares the backend.
#[derive(Clone)]
pub struct RecaptchaVerifier {
    project_id: String,
    backend: Arc<dyn AssessmentBackend>,
}

impl RecaptchaVerifier {
    /// Create a verifier over an arbitrary backend.
    pub fn new(project_id: impl Into<String>, backend: Arc<dyn AssessmentBackend>) -> Self {
        Self {
            project_id: project_id.into(),
            backend,
        }
    }

    /// Build an HTTP-backed verifier from settings.
    ///
    /// Returns `None` when no project id is configured.
    pub fn from_settings(settings: &RecaptchaSettings) -> Option<Self> {
        let project_id = match settings.project_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                warn!("reCAPTCHA project id not configured - skipping reCAPTCHA verification");
                return None;
            }
        };

        let backend = HttpAssessmentBackend::from_settings(settings);
        Some(Self::new(project_id, Arc::new(backend)))
    }

    /// Project this verifier assesses tokens under.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn classify_failure(err: &BackendError) -> VerificationOutcome {
        match err {
            BackendError::RateLimited => {
                error!("reCAPTCHA backend rate limited the assessment: {}", err);
            }
            BackendError::Transport(_) | BackendError::Api { .. } => {
                error!("Assessment API error during reCAPTCHA verification: {}", err);
            }
            BackendError::RetryExhausted { .. } => {
                error!("Retry limit exceeded for reCAPTCHA verification: {}", err);
            }
            BackendError::MalformedResponse(_) => {
                error!("Unexpected error during reCAPTCHA verification: {:?}", err);
            }
        }
        VerificationOutcome::Indeterminate
    }
}

impl fmt::Debug for RecaptchaVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecaptchaVerifier")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier for RecaptchaVerifier {
    fn verify_token(&self, token: &str, site_key: &str) -> VerificationOutcome {
        if site_key.trim().is_empty() {
            error!("reCAPTCHA site key is required");
            return VerificationOutcome::Indeterminate;
        }

        if token.trim().is_empty() {
            warn!("Empty reCAPTCHA token provided");
            return VerificationOutcome::Invalid;
        }

        match self.backend.create_assessment(&self.project_id, token, site_key) {
            Ok(props) if props.valid => {
                info!("reCAPTCHA token verification successful");
                VerificationOutcome::Valid
            }
            Ok(props) => {
                warn!(
                    "reCAPTCHA token invalid: {}",
                    props.invalid_reason.as_deref().unwrap_or("unspecified")
                );
                VerificationOutcome::Invalid
            }
            Err(err) => Self::classify_failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Backend returning a scripted answer and recording calls.
    struct ScriptedBackend {
        answer: BackendResult<TokenProperties>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedBackend {
        fn new(answer: BackendResult<TokenProperties>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl AssessmentBackend for ScriptedBackend {
        fn create_assessment(&self, project_id: &str, token: &str, site_key: &str) -> BackendResult<TokenProperties> {
            self.calls
                .lock()
                .push((project_id.to_string(), token.to_string(), site_key.to_string()));
            self.answer.clone()
        }
    }

    #[test]
    fn test_blank_site_key_is_indeterminate() {
        let backend = ScriptedBackend::new(Ok(TokenProperties::valid()));
        let verifier = RecaptchaVerifier::new("proj", backend.clone());

        assert_eq!(verifier.verify_token("token", "  "), VerificationOutcome::Indeterminate);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_blank_token_is_invalid() {
        let backend = ScriptedBackend::new(Ok(TokenProperties::valid()));
        let verifier = RecaptchaVerifier::new("proj", backend.clone());

        assert_eq!(verifier.verify_token("", "site"), VerificationOutcome::Invalid);
        assert_eq!(verifier.verify_token(" \t", "site"), VerificationOutcome::Invalid);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_backend_verdicts() {
        let backend = ScriptedBackend::new(Ok(TokenProperties::valid()));
        let verifier = RecaptchaVerifier::new("proj", backend.clone());
        assert_eq!(verifier.verify_token("tok", "site"), VerificationOutcome::Valid);
        assert_eq!(
            backend.calls.lock()[0],
            ("proj".to_string(), "tok".to_string(), "site".to_string())
        );

        let backend = ScriptedBackend::new(Ok(TokenProperties::invalid("EXPIRED")));
        let verifier = RecaptchaVerifier::new("proj", backend);
        assert_eq!(verifier.verify_token("tok", "site"), VerificationOutcome::Invalid);
    }

    #[test]
    fn test_every_backend_error_is_indeterminate() {
        let errors = vec![
            BackendError::RateLimited,
            BackendError::Transport("timed out".into()),
            BackendError::Api { status: 500, message: "boom".into() },
            BackendError::RetryExhausted { attempts: 3, last: "reset".into() },
            BackendError::MalformedResponse("not json".into()),
        ];

        for err in errors {
            let verifier = RecaptchaVerifier::new("proj", ScriptedBackend::new(Err(err.clone())));
            assert_eq!(
                verifier.verify_token("tok", "site"),
                VerificationOutcome::Indeterminate,
                "{err:?} should fail open"
            );
        }
    }

    #[test]
    fn test_from_settings_requires_project_id() {
        let settings = RecaptchaSettings::default();
        assert!(RecaptchaVerifier::from_settings(&settings).is_none());

        let settings = RecaptchaSettings {
            project_id: Some("  ".into()),
            ..RecaptchaSettings::default()
        };
        assert!(RecaptchaVerifier::from_settings(&settings).is_none());

        let settings = RecaptchaSettings {
            project_id: Some("my-project".into()),
            ..RecaptchaSettings::default()
        };
        let verifier = RecaptchaVerifier::from_settings(&settings).unwrap();
        assert_eq!(verifier.project_id(), "my-project");
    }
}
