//! Payload and configuration types threaded through the pipeline.
//!
//! Both are thin wrappers over JSON maps so that arbitrary registration form
//! fields and arbitrary step options pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Form field holding the candidate username.
pub const USERNAME_FIELD: &str = "username";

/// Form field holding the client-side reCAPTCHA token.
pub const RECAPTCHA_TOKEN_FIELD: &str = "recaptcha_token";

/// Registration form data for one in-flight sign-up request.
///
/// Steps receive it by value and hand it back when they allow the
/// registration, so a step can only mutate the payload while it runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationPayload {
    fields: Map<String, Value>,
}

impl RegistrationPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a payload from an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Get a raw field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Check if a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get a field coerced to trimmed text.
    ///
    /// Missing fields and `null` read as empty text. Strings are taken as-is,
    /// everything else uses its JSON rendering.
    pub fn text(&self, name: &str) -> String {
        match self.fields.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string().trim().to_string(),
        }
    }

    /// The normalized candidate username.
    pub fn username(&self) -> String {
        self.text(USERNAME_FIELD)
    }

    /// The submitted reCAPTCHA token, empty if absent.
    pub fn recaptcha_token(&self) -> String {
        self.text(RECAPTCHA_TOKEN_FIELD)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the payload, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for RegistrationPayload {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// Options bound to a step instance at construction.
///
/// Immutable once built; steps parse what they need from it up front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepConfig {
    options: Map<String, Value>,
}

impl StepConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style option setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Get an option value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Check if an option is set.
    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Check if no options are set.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl From<Map<String, Value>> for StepConfig {
    fn from(options: Map<String, Value>) -> Self {
        Self { options }
    }
}
