//! Step registry for resolving configured step ids to implementations.

use crate::config::Settings;
use crate::core::step::{RegistrationStep, StepMetadata};
use crate::core::toggles::{FeatureToggles, ToggleStore};
use crate::core::types::StepConfig;
use crate::recaptcha::verifier::{RecaptchaVerifier, TokenVerifier};
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory function for creating step instances.
pub type StepFactory = Arc<dyn Fn(&StepConfig, &StepServices) -> Box<dyn RegistrationStep> + Send + Sync>;

/// Capabilities shared by every step built from a registry.
#[derive(Clone)]
pub struct StepServices {
    /// Feature toggles, queried on every request.
    pub toggles: Arc<dyn FeatureToggles>,
    /// reCAPTCHA site key per platform identifier.
    pub site_keys: Arc<IndexMap<String, String>>,
    /// Token verifier; `None` when verification is not configured.
    pub verifier: Option<Arc<dyn TokenVerifier>>,
}

impl StepServices {
    /// Create services with the given toggles, no site keys and no verifier.
    pub fn new(toggles: Arc<dyn FeatureToggles>) -> Self {
        Self {
            toggles,
            site_keys: Arc::new(IndexMap::new()),
            verifier: None,
        }
    }

    /// Build services from settings, including an HTTP-backed verifier
    /// when a project id is configured.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut services = Self::new(Arc::new(settings.toggle_store()));
        services.site_keys = Arc::new(settings.recaptcha.site_keys.clone());
        services.verifier = RecaptchaVerifier::from_settings(&settings.recaptcha)
            .map(|v| Arc::new(v) as Arc<dyn TokenVerifier>);
        services
    }

    /// Replace the site keys.
    pub fn with_site_keys<I, K, V>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.site_keys = Arc::new(keys.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Replace the verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

impl Default for StepServices {
    fn default() -> Self {
        Self::new(Arc::new(ToggleStore::new()))
    }
}

/// Registry entry containing metadata and factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to create instances.
    pub factory: StepFactory,
    /// Cached metadata (avoids creating instance just to get metadata).
    pub metadata: StepMetadata,
}

/// Registry for all available step types, in registration order.
pub struct StepRegistry {
    steps: IndexMap<String, RegistryEntry>,
}

impl StepRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            steps: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with built-in steps.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::steps::builtin::register_all(&mut registry);
        registry
    }

    /// Register a step type. A later registration with the same id replaces
    /// the earlier one.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn(&StepConfig, &StepServices) -> Box<dyn RegistrationStep> + Send + Sync + 'static,
    {
        // Create a temporary instance to get metadata
        let instance = factory(&StepConfig::default(), &StepServices::default());
        let metadata = instance.metadata();

        let entry = RegistryEntry {
            factory: Arc::new(factory),
            metadata,
        };
        self.steps.insert(entry.metadata.id.clone(), entry);
    }

    /// Create a new instance of a step by id.
    pub fn create(&self, id: &str, config: &StepConfig, services: &StepServices) -> Option<Box<dyn RegistrationStep>> {
        self.steps.get(id).map(|e| (e.factory)(config, services))
    }

    /// Get metadata for a step without creating an instance.
    pub fn get_metadata(&self, id: &str) -> Option<&StepMetadata> {
        self.steps.get(id).map(|e| &e.metadata)
    }

    /// Check if a step is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    /// Get all registered step ids.
    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(|s| s.as_str())
    }

    /// Get all registered steps.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.steps.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Unregister a step.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.steps.shift_remove(id).is_some()
    }

    /// Get the total number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
