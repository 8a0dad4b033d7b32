//! Request context passed to steps.
//!
//! The context carries what a step may need to know about the in-flight HTTP
//! request: header values and session markers. It is passed explicitly so
//! steps can be exercised without a web server. `RequestContext::default()`
//! stands for "no request available" and yields the safe defaults.

use serde_json::Value;
use std::collections::HashMap;

/// Header naming the mobile platform the registration comes from.
pub const PLATFORM_HEADER: &str = "Mobile-Platform-Identifier";

/// Platform assumed when no header is present.
pub const DEFAULT_PLATFORM: &str = "web";

/// Session keys set by a partially completed third-party auth pipeline.
pub const SSO_SESSION_KEYS: &[&str] = &["partial_pipeline_token", "partial_pipeline_token_"];

/// Snapshot of the ambient request for one registration.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Header values keyed by lower-cased header name.
    headers: HashMap<String, String>,
    /// Session values.
    session: HashMap<String, Value>,
}

impl RequestContext {
    /// Create a context with no headers and an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style header setter.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Builder-style session setter.
    pub fn with_session(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    /// Set a header. Names are case-insensitive.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Get a header value. Names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Get a session value.
    pub fn session_value(&self, key: &str) -> Option<&Value> {
        self.session.get(key)
    }

    /// Platform the request originates from, `"web"` when unspecified.
    pub fn current_platform(&self) -> &str {
        self.header(PLATFORM_HEADER).unwrap_or(DEFAULT_PLATFORM)
    }

    /// Whether this registration is part of a single-sign-on flow.
    pub fn is_sso_flow(&self) -> bool {
        SSO_SESSION_KEYS
            .iter()
            .any(|key| self.session.get(*key).map(is_truthy).unwrap_or(false))
    }
}

/// Session markers count only when they hold a non-empty value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
