//! Error types for signup-guard.
//!
//! Uses thiserror for structured errors. Only [`Rejection`] is meant to reach
//! an end user; every other type here is either absorbed by a step (fail-open)
//! or reported to the host while the pipeline is being built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status code carried by every policy rejection.
pub const FORBIDDEN: u16 = 403;

/// Structured, user-facing outcome that halts the registration pipeline.
///
/// A step returns this as the `Err` side of its result. The host translates
/// it into an HTTP response; nothing in this crate catches it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} ({error_code}, status {status_code})")]
pub struct Rejection {
    message: String,
    status_code: u16,
    error_code: String,
}

impl Rejection {
    /// Create a new rejection.
    pub fn new(message: impl Into<String>, status_code: u16, error_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            error_code: error_code.into(),
        }
    }

    /// Create a 403 rejection.
    pub fn forbidden(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self::new(message, FORBIDDEN, error_code)
    }

    /// Human-readable message shown to the registrant.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Stable machine identifier.
    pub fn error_code(&self) -> &str {
        &self.error_code
    }
}

/// Failures reported by the assessment backend.
///
/// Every variant maps to an indeterminate verification outcome. New failure
/// modes must be added here and classified explicitly by the verifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("assessment backend is rate limiting requests")]
    RateLimited,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("assessment API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: String },

    #[error("malformed assessment response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Whether the client may retry the call.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::Api { status, .. } => *status >= 500,
            BackendError::RateLimited
            | BackendError::RetryExhausted { .. }
            | BackendError::MalformedResponse(_) => false,
        }
    }
}

/// Failures inside the CAPTCHA step that are not a verification verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecaptchaError {
    #[error("no reCAPTCHA site keys configured")]
    NoSiteKeys,

    #[error("no reCAPTCHA site key for platform '{0}'")]
    NoSiteKeyForPlatform(String),

    #[error("reCAPTCHA verification backend is not configured")]
    VerifierUnavailable,
}

/// Errors raised while loading settings or assembling a pipeline.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown pipeline step '{0}'")]
    UnknownStep(String),

    #[error("no pipeline configured for filter '{0}'")]
    UnknownFilter(String),

    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Result of running a step or a pipeline.
pub type StepResult<T> = Result<T, Rejection>;

/// Result type alias for settings and pipeline assembly.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_fields() {
        let rejection = Rejection::forbidden("nope", "forbidden-username");
        assert_eq!(rejection.message(), "nope");
        assert_eq!(rejection.status_code(), 403);
        assert_eq!(rejection.error_code(), "forbidden-username");
    }

    #[test]
    fn test_rejection_serializes_all_fields() {
        let rejection = Rejection::new("try again", 403, "recaptcha-verification-failed");
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["message"], "try again");
        assert_eq!(json["status_code"], 403);
        assert_eq!(json["error_code"], "recaptcha-verification-failed");
    }

    #[test]
    fn test_backend_error_retryable() {
        assert!(BackendError::Transport("reset".into()).is_retryable());
        assert!(BackendError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(!BackendError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!BackendError::RateLimited.is_retryable());
        assert!(!BackendError::MalformedResponse("eof".into()).is_retryable());
    }
}
