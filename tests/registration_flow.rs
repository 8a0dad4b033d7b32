//! End-to-end tests for the registration pipeline.

use signup_guard::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const SETTINGS: &str = r#"
[recaptcha.site_keys]
web = "site-web"
ios = "site-ios"

[toggles]
"filters_pipelines.enable_registration_recaptcha_validation" = true

[filters."org.openedx.learning.student.registration.requested.v1"]
pipeline = ["forbidden_username", "verify_recaptcha_token"]
forbidden_terms = ["admin", "test", "staff"]
"#;

/// Backend that accepts one known token and counts calls.
struct KnownTokenBackend {
    accepted: &'static str,
    calls: AtomicUsize,
}

impl AssessmentBackend for KnownTokenBackend {
    fn create_assessment(&self, _project_id: &str, token: &str, _site_key: &str) -> Result<TokenProperties, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token == self.accepted {
            Ok(TokenProperties::valid())
        } else {
            Ok(TokenProperties::invalid("INVALID_TOKEN"))
        }
    }
}

/// Backend that always fails with a transient error.
struct FailingBackend;

impl AssessmentBackend for FailingBackend {
    fn create_assessment(&self, _project_id: &str, _token: &str, _site_key: &str) -> Result<TokenProperties, BackendError> {
        Err(BackendError::Transport("connection reset by peer".to_string()))
    }
}

fn pipeline_with(backend: Arc<dyn AssessmentBackend>) -> RegistrationPipeline {
    let settings = Settings::from_toml(SETTINGS).unwrap();
    let verifier = RecaptchaVerifier::new("test-project", backend);
    let services = StepServices::from_settings(&settings).with_verifier(Arc::new(verifier));
    RegistrationPipeline::from_settings(
        &settings,
        REGISTRATION_REQUESTED,
        &StepRegistry::with_builtins(),
        &services,
    )
    .unwrap()
}

fn known_token_backend() -> Arc<KnownTokenBackend> {
    Arc::new(KnownTokenBackend {
        accepted: "good-token",
        calls: AtomicUsize::new(0),
    })
}

fn form(username: &str, token: &str) -> RegistrationPayload {
    RegistrationPayload::new()
        .with("username", username)
        .with("email", "learner@example.com")
        .with("recaptcha_token", token)
}

#[test]
fn test_forbidden_username_rejected_before_captcha() {
    let backend = known_token_backend();
    let pipeline = pipeline_with(backend.clone());

    let err = pipeline
        .run(form("Admin2024", "good-token"), &RequestContext::default())
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.error_code(), "forbidden-username");
    assert!(err
        .message()
        .contains("Usernames can't include words that could be mistaken for course roles."));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_clean_registration_accepted_unchanged() {
    let backend = known_token_backend();
    let pipeline = pipeline_with(backend.clone());

    let payload = form("learner42", "good-token");
    let out = pipeline.run(payload.clone(), &RequestContext::default()).unwrap();
    assert_eq!(out, payload);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bad_token_rejected() {
    let pipeline = pipeline_with(known_token_backend());

    let err = pipeline
        .run(form("learner42", "forged"), &RequestContext::default())
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.error_code(), "recaptcha-verification-failed");
}

#[test]
fn test_missing_token_rejected() {
    let pipeline = pipeline_with(known_token_backend());
    let payload = RegistrationPayload::new().with("username", "learner42");

    let err = pipeline.run(payload, &RequestContext::default()).unwrap_err();
    assert_eq!(err.error_code(), "recaptcha-verification-failed");
}

#[test]
fn test_sso_registration_skips_captcha() {
    let backend = known_token_backend();
    let pipeline = pipeline_with(backend.clone());
    let ctx = RequestContext::new().with_session("partial_pipeline_token", "pipeline-123");

    assert!(pipeline.run(form("learner42", "forged"), &ctx).is_ok());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unconfigured_platform_allowed() {
    let pipeline = pipeline_with(known_token_backend());
    let ctx = RequestContext::new().with_header("Mobile-Platform-Identifier", "android");

    assert!(pipeline.run(form("learner42", "forged"), &ctx).is_ok());
}

#[test]
fn test_backend_failure_fails_open() {
    let pipeline = pipeline_with(Arc::new(FailingBackend));
    assert!(pipeline
        .run(form("learner42", "any-token"), &RequestContext::default())
        .is_ok());
}

#[test]
fn test_no_project_configured_allows() {
    let settings = Settings::from_toml(SETTINGS).unwrap();
    let services = StepServices::from_settings(&settings);
    assert!(services.verifier.is_none());

    let pipeline = RegistrationPipeline::from_settings(
        &settings,
        REGISTRATION_REQUESTED,
        &StepRegistry::with_builtins(),
        &services,
    )
    .unwrap();
    assert!(pipeline
        .run(form("learner42", "forged"), &RequestContext::default())
        .is_ok());
}

#[test]
fn test_pipeline_shared_across_threads() {
    let backend = known_token_backend();
    let pipeline = Arc::new(pipeline_with(backend.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                let token = if i % 2 == 0 { "good-token" } else { "forged" };
                pipeline
                    .run(form(&format!("learner{}", i), token), &RequestContext::default())
                    .is_ok()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(accepted, 4);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 8);
}
