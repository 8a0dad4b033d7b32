//! Feature toggles queried by name.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Flag gating reCAPTCHA validation on registration.
pub const ENABLE_RECAPTCHA_VALIDATION: &str = "filters_pipelines.enable_registration_recaptcha_validation";

/// Process-wide boolean flags.
///
/// Values may change between requests; callers must query on every use
/// rather than caching the answer.
pub trait FeatureToggles: Send + Sync {
    /// Whether the named flag is on. Unknown flags are off.
    fn is_enabled(&self, name: &str) -> bool;
}

/// In-memory toggle store that can be flipped at runtime.
#[derive(Debug, Default)]
pub struct ToggleStore {
    flags: RwLock<HashMap<String, bool>>,
}

impl ToggleStore {
    /// Create a store with every flag off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given flags.
    pub fn from_flags<I, K>(flags: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        Self {
            flags: RwLock::new(flags.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Turn a flag on or off.
    pub fn set(&self, name: impl Into<String>, enabled: bool) {
        self.flags.write().insert(name.into(), enabled);
    }

    /// Forget a flag, which turns it off.
    pub fn clear(&self, name: &str) -> bool {
        self.flags.write().remove(name).is_some()
    }
}

impl FeatureToggles for ToggleStore {
    fn is_enabled(&self, name: &str) -> bool {
        self.flags.read().get(name).copied().unwrap_or(false)
    }
}
