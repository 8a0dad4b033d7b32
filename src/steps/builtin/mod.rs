//! Built-in step implementations.

mod forbidden_username;
mod recaptcha;

use crate::core::step::AllowAll;
use crate::steps::registry::StepRegistry;

/// Register all built-in steps.
pub fn register_all(registry: &mut StepRegistry) {
    registry.register(|_, _| Box::new(AllowAll));
    forbidden_username::register(registry);
    recaptcha::register(registry);
}

// Re-export for direct access
pub use forbidden_username::{
    PreventForbiddenUsername, FORBIDDEN_TERMS, FORBIDDEN_USERNAME, FORBIDDEN_USERNAME_MESSAGE,
    LEGACY_FORBIDDEN_TERMS,
};
pub use recaptcha::{VerifyRecaptchaToken, RECAPTCHA_FAILED_MESSAGE, RECAPTCHA_VERIFICATION_FAILED};
