//! Forbidden-username step: blocks usernames containing disallowed words.

use crate::core::context::RequestContext;
use crate::core::error::{Rejection, StepResult};
use crate::core::step::{RegistrationStep, StepMetadata};
use crate::core::types::{RegistrationPayload, StepConfig};
use crate::steps::registry::StepRegistry;
use log::{debug, info, warn};
use serde_json::Value;

/// Option listing the forbidden substrings.
pub const FORBIDDEN_TERMS: &str = "forbidden_terms";

/// Older name for [`FORBIDDEN_TERMS`], read only when the new one is absent.
pub const LEGACY_FORBIDDEN_TERMS: &str = "forbidden_usernames";

/// Error code of the rejection.
pub const FORBIDDEN_USERNAME: &str = "forbidden-username";

/// Message shown to the registrant.
pub const FORBIDDEN_USERNAME_MESSAGE: &str =
    "Usernames can't include words that could be mistaken for course roles. Please choose a different username.";

/// Register this step.
pub fn register(registry: &mut StepRegistry) {
    registry.register(|config, _services| Box::new(PreventForbiddenUsername::from_config(config)));
}

/// Rejects registration when the username contains a forbidden term.
///
/// Matching is case-insensitive substring containment, so "administrator"
/// matches "admin". Terms are scanned in configured order and the first hit
/// wins. A malformed term list never blocks registration.
#[derive(Debug, Clone, Default)]
pub struct PreventForbiddenUsername {
    /// (as configured, lower-cased)
    terms: Vec<(String, String)>,
}

impl PreventForbiddenUsername {
    /// Create the step from an explicit term list.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms = terms
            .into_iter()
            .map(Into::<String>::into)
            .filter(|t| !t.trim().is_empty())
            .map(|t| {
                let lower = t.to_lowercase();
                (t, lower)
            })
            .collect();
        Self { terms }
    }

    /// Create the step from its configuration.
    pub fn from_config(config: &StepConfig) -> Self {
        Self::new(parse_terms(config))
    }

    /// Effective forbidden terms, in match order.
    pub fn forbidden_terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(t, _)| t.as_str())
    }

    /// First configured term contained in `username`, ignoring case.
    pub fn find_match(&self, username: &str) -> Option<&str> {
        let username = username.to_lowercase();
        self.terms
            .iter()
            .find(|(_, lower)| username.contains(lower.as_str()))
            .map(|(term, _)| term.as_str())
    }
}

impl RegistrationStep for PreventForbiddenUsername {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::builder("forbidden_username", "Prevent Forbidden Username")
            .description("Blocks usernames containing words that could be mistaken for course roles")
            .option(FORBIDDEN_TERMS)
            .error_code(FORBIDDEN_USERNAME)
            .build()
    }

    fn apply(&self, payload: RegistrationPayload, _ctx: &RequestContext) -> StepResult<RegistrationPayload> {
        let username = payload.username();
        if username.is_empty() || self.terms.is_empty() {
            return Ok(payload);
        }

        if let Some(term) = self.find_match(&username) {
            info!(
                "Registration blocked: username '{}' contains forbidden term '{}'.",
                username, term
            );
            return Err(Rejection::forbidden(FORBIDDEN_USERNAME_MESSAGE, FORBIDDEN_USERNAME));
        }

        Ok(payload)
    }
}

/// Read the term list, dropping anything that is not usable text.
fn parse_terms(config: &StepConfig) -> Vec<String> {
    let (key, value) = match config.get(FORBIDDEN_TERMS) {
        Some(value) => (FORBIDDEN_TERMS, value),
        None => match config.get(LEGACY_FORBIDDEN_TERMS) {
            Some(value) => (LEGACY_FORBIDDEN_TERMS, value),
            None => return Vec::new(),
        },
    };

    let items = match value {
        Value::Array(items) => items,
        other => {
            warn!(
                "'{}' must be a list of strings, got {}; no usernames will be blocked",
                key, other
            );
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(term) => Some(term.clone()),
            other => {
                debug!("Ignoring non-text entry {} in '{}'", other, key);
                None
            }
        })
        .collect()
}
