//! Settings loaded from a TOML file.
//!
//! ```toml
//! [recaptcha]
//! project_id = "my-project"
//! api_key = "..."
//! [recaptcha.site_keys]
//! web = "site-key-web"
//!
//! [toggles]
//! "filters_pipelines.enable_registration_recaptcha_validation" = true
//!
//! [filters."org.openedx.learning.student.registration.requested.v1"]
//! pipeline = ["forbidden_username", "verify_recaptcha_token"]
//! forbidden_terms = ["admin", "test", "staff"]
//! ```

use crate::core::error::{ConfigError, ConfigResult};
use crate::core::toggles::ToggleStore;
use crate::core::types::StepConfig;
use crate::recaptcha::http::DEFAULT_ENDPOINT;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Filter event raised when a learner submits the registration form.
pub const REGISTRATION_REQUESTED: &str = "org.openedx.learning.student.registration.requested.v1";

/// Environment variable overriding `recaptcha.api_key`.
pub const API_KEY_ENV: &str = "SIGNUP_GUARD_RECAPTCHA_API_KEY";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    2
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// reCAPTCHA verification settings.
    #[serde(default)]
    pub recaptcha: RecaptchaSettings,
    /// Initial feature toggle values.
    #[serde(default)]
    pub toggles: IndexMap<String, bool>,
    /// Pipelines keyed by filter event name.
    #[serde(default)]
    pub filters: IndexMap<String, FilterSettings>,
}

/// reCAPTCHA project identity, client tuning and per-platform site keys.
#[derive(Debug, Clone, Deserialize)]
pub struct RecaptchaSettings {
    /// Cloud project owning the reCAPTCHA keys. Verification is skipped without it.
    #[serde(default)]
    pub project_id: Option<String>,
    /// API key used to authenticate assessment calls.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Assessment API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-call timeout enforced by the HTTP client.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Attempts for retryable backend failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Site key per platform identifier.
    #[serde(default)]
    pub site_keys: IndexMap<String, String>,
}

impl Default for RecaptchaSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            site_keys: IndexMap::new(),
        }
    }
}

/// One filter event: its ordered steps and the options they share.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSettings {
    /// Step ids, in execution order.
    pub pipeline: Vec<String>,
    /// Every other key of the table, handed to each step.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FilterSettings {
    /// Options handed to the steps of this filter.
    pub fn step_config(&self) -> StepConfig {
        StepConfig::from(self.extra.clone())
    }
}

impl Settings {
    /// Load settings from a TOML file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut settings = Self::from_toml(&raw)?;
        settings.apply_env();
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.check()?;
        Ok(settings)
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.recaptcha.api_key = Some(key);
            }
        }
    }

    /// Feature toggle store seeded from `[toggles]`.
    pub fn toggle_store(&self) -> ToggleStore {
        ToggleStore::from_flags(self.toggles.iter().map(|(k, v)| (k.clone(), *v)))
    }

    /// Settings for one filter event.
    pub fn filter(&self, name: &str) -> ConfigResult<&FilterSettings> {
        self.filters
            .get(name)
            .ok_or_else(|| ConfigError::UnknownFilter(name.to_string()))
    }

    fn check(&self) -> ConfigResult<()> {
        if self.recaptcha.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "recaptcha.timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.recaptcha.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "recaptcha.endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[recaptcha]
project_id = "my-project"
timeout_ms = 1500

[recaptcha.site_keys]
web = "site-web"
ios = "site-ios"

[toggles]
"filters_pipelines.enable_registration_recaptcha_validation" = true

[filters."org.openedx.learning.student.registration.requested.v1"]
pipeline = ["forbidden_username", "verify_recaptcha_token"]
forbidden_terms = ["admin", "test", "staff"]
"#;

    #[test]
    fn test_parse_sample() {
        let settings = Settings::from_toml(SAMPLE).unwrap();
        assert_eq!(settings.recaptcha.project_id.as_deref(), Some("my-project"));
        assert_eq!(settings.recaptcha.timeout_ms, 1500);
        assert_eq!(settings.recaptcha.max_attempts, 2);
        assert_eq!(settings.recaptcha.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.recaptcha.site_keys.get("ios").map(String::as_str), Some("site-ios"));

        let filter = settings.filter(REGISTRATION_REQUESTED).unwrap();
        assert_eq!(filter.pipeline, vec!["forbidden_username", "verify_recaptcha_token"]);
        let config = filter.step_config();
        assert_eq!(
            config.get("forbidden_terms"),
            Some(&serde_json::json!(["admin", "test", "staff"]))
        );
        assert!(!config.contains("pipeline"));
    }

    #[test]
    fn test_toggle_store_seeded() {
        use crate::core::toggles::{FeatureToggles, ENABLE_RECAPTCHA_VALIDATION};

        let settings = Settings::from_toml(SAMPLE).unwrap();
        assert!(settings.toggle_store().is_enabled(ENABLE_RECAPTCHA_VALIDATION));
        assert!(!Settings::default().toggle_store().is_enabled(ENABLE_RECAPTCHA_VALIDATION));
    }

    #[test]
    fn test_empty_settings() {
        let settings = Settings::from_toml("").unwrap();
        assert!(settings.recaptcha.site_keys.is_empty());
        assert!(matches!(
            settings.filter(REGISTRATION_REQUESTED),
            Err(ConfigError::UnknownFilter(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_toml("[recaptcha]\ntimeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = Settings::from_toml("unknown_section = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.filters.len(), 1);
    }

    #[test]
    fn test_env_overrides_api_key() {
        let mut settings = Settings::from_toml("[recaptcha]\napi_key = \"from-file\"\n").unwrap();
        std::env::set_var(API_KEY_ENV, "from-env");
        settings.apply_env();
        std::env::remove_var(API_KEY_ENV);
        assert_eq!(settings.recaptcha.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
