//! reCAPTCHA Enterprise assessment client over HTTP.

use crate::config::RecaptchaSettings;
use crate::core::error::{BackendError, BackendResult};
use crate::recaptcha::verifier::{AssessmentBackend, TokenProperties};
use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Default REST endpoint for assessments.
pub const DEFAULT_ENDPOINT: &str = "https://recaptchaenterprise.googleapis.com/v1";

/// Blocking HTTP client for the assessments API.
///
/// The underlying agent pools connections and is shared by every call, so
/// one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct HttpAssessmentBackend {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
    max_attempts: u32,
}

impl HttpAssessmentBackend {
    /// Create a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            max_attempts: 1,
        }
    }

    /// Build a client from settings.
    pub fn from_settings(settings: &RecaptchaSettings) -> Self {
        Self::new(
            settings.endpoint.clone(),
            settings.api_key.clone(),
            Duration::from_millis(settings.timeout_ms),
        )
        .with_max_attempts(settings.max_attempts)
    }

    /// Set how many times a retryable failure is attempted. At least one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// URL assessments for `project_id` are posted to.
    pub fn assessment_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}/assessments", self.endpoint, project_id)
    }

    fn send_once(&self, project_id: &str, token: &str, site_key: &str) -> BackendResult<TokenProperties> {
        let mut request = self.agent.post(&self.assessment_url(project_id));
        if let Some(key) = &self.api_key {
            request = request.query("key", key);
        }

        let body = json!({
            "event": {
                "token": token,
                "siteKey": site_key,
            }
        });

        match request.send_json(body) {
            Ok(response) => {
                let text = response
                    .into_string()
                    .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
                parse_assessment(&text)
            }
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(classify_status(status, &text))
            }
            Err(ureq::Error::Transport(transport)) => Err(BackendError::Transport(transport.to_string())),
        }
    }
}

impl AssessmentBackend for HttpAssessmentBackend {
    fn create_assessment(&self, project_id: &str, token: &str, site_key: &str) -> BackendResult<TokenProperties> {
        let mut last = None;

        for attempt in 1..=self.max_attempts {
            match self.send_once(project_id, token, site_key) {
                Ok(props) => return Ok(props),
                Err(err) if err.is_retryable() => {
                    debug!("Assessment attempt {}/{} failed: {}", attempt, self.max_attempts, err);
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        match last {
            Some(err) if self.max_attempts == 1 => Err(err),
            Some(err) => Err(BackendError::RetryExhausted {
                attempts: self.max_attempts,
                last: err.to_string(),
            }),
            None => Err(BackendError::Transport("no assessment attempt was made".to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentResponse {
    token_properties: Option<TokenPropertiesBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPropertiesBody {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    invalid_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Parse a successful assessment response body.
pub fn parse_assessment(body: &str) -> BackendResult<TokenProperties> {
    let response: AssessmentResponse =
        serde_json::from_str(body).map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

    let props = response
        .token_properties
        .ok_or_else(|| BackendError::MalformedResponse("missing tokenProperties".to_string()))?;

    Ok(TokenProperties {
        valid: props.valid,
        invalid_reason: if props.valid { None } else { props.invalid_reason },
    })
}

/// Map a non-success HTTP status to a backend error.
pub fn classify_status(status: u16, body: &str) -> BackendError {
    if status == 429 {
        return BackendError::RateLimited;
    }

    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    BackendError::Api { status, message }
}
