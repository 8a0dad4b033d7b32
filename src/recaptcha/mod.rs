//! reCAPTCHA verification capability.
//!
//! [`RecaptchaVerifier`] classifies tokens; [`HttpAssessmentBackend`] talks to
//! the remote scoring service.

pub mod http;
pub mod verifier;

pub use http::HttpAssessmentBackend;
pub use verifier::{AssessmentBackend, RecaptchaVerifier, TokenProperties, TokenVerifier, VerificationOutcome};
