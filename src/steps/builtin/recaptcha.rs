//! CAPTCHA step: blocks registration when proof-of-humanity fails.
//!
//! Only a definitive `Invalid` verdict rejects. A disabled toggle, an SSO
//! flow, missing configuration and backend failures all let the registration
//! through.

use crate::core::context::RequestContext;
use crate::core::error::{RecaptchaError, Rejection, StepResult};
use crate::core::step::{RegistrationStep, StepMetadata};
use crate::core::toggles::{FeatureToggles, ENABLE_RECAPTCHA_VALIDATION};
use crate::core::types::{RegistrationPayload, RECAPTCHA_TOKEN_FIELD};
use crate::recaptcha::verifier::{TokenVerifier, VerificationOutcome};
use crate::steps::registry::{StepRegistry, StepServices};
use indexmap::IndexMap;
use log::{error, info, warn};
use std::sync::Arc;

/// Error code of the rejection.
pub const RECAPTCHA_VERIFICATION_FAILED: &str = "recaptcha-verification-failed";

/// Message shown to the registrant.
pub const RECAPTCHA_FAILED_MESSAGE: &str = "reCAPTCHA verification failed. Please try again.";

/// Register this step.
pub fn register(registry: &mut StepRegistry) {
    registry.register(|_config, services| Box::new(VerifyRecaptchaToken::new(services)));
}

/// Verifies the `recaptcha_token` submitted with the registration form.
pub struct VerifyRecaptchaToken {
    toggles: Arc<dyn FeatureToggles>,
    site_keys: Arc<IndexMap<String, String>>,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl VerifyRecaptchaToken {
    /// Create the step over the shared capabilities.
    pub fn new(services: &StepServices) -> Self {
        Self {
            toggles: Arc::clone(&services.toggles),
            site_keys: Arc::clone(&services.site_keys),
            verifier: services.verifier.clone(),
        }
    }

    /// Resolve the site key and ask the verifier.
    ///
    /// Errors mean verification does not apply to this request.
    fn verify(&self, payload: &RegistrationPayload, ctx: &RequestContext) -> Result<VerificationOutcome, RecaptchaError> {
        if self.site_keys.is_empty() {
            return Err(RecaptchaError::NoSiteKeys);
        }

        let platform = ctx.current_platform();
        let site_key = self
            .site_keys
            .get(platform)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RecaptchaError::NoSiteKeyForPlatform(platform.to_string()))?;

        let verifier = self.verifier.as_ref().ok_or(RecaptchaError::VerifierUnavailable)?;

        Ok(verifier.verify_token(&payload.recaptcha_token(), site_key))
    }
}

impl RegistrationStep for VerifyRecaptchaToken {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::builder("verify_recaptcha_token", "Verify reCAPTCHA Token")
            .description(format!(
                "Checks the '{}' form field when '{}' is enabled",
                RECAPTCHA_TOKEN_FIELD, ENABLE_RECAPTCHA_VALIDATION
            ))
            .error_code(RECAPTCHA_VERIFICATION_FAILED)
            .build()
    }

    fn apply(&self, payload: RegistrationPayload, ctx: &RequestContext) -> StepResult<RegistrationPayload> {
        if !self.toggles.is_enabled(ENABLE_RECAPTCHA_VALIDATION) {
            return Ok(payload);
        }

        if ctx.is_sso_flow() {
            info!("SSO registration detected - skipping reCAPTCHA verification");
            return Ok(payload);
        }

        match self.verify(&payload, ctx) {
            Ok(VerificationOutcome::Valid) => {
                info!("reCAPTCHA token verification passed.");
                Ok(payload)
            }
            Ok(VerificationOutcome::Invalid) => {
                error!("reCAPTCHA token verification failed.");
                Err(Rejection::forbidden(RECAPTCHA_FAILED_MESSAGE, RECAPTCHA_VERIFICATION_FAILED))
            }
            Ok(VerificationOutcome::Indeterminate) => {
                error!("reCAPTCHA verification could not be completed - allowing registration");
                Ok(payload)
            }
            Err(err) => {
                warn!("{} - skipping reCAPTCHA verification", err);
                Ok(payload)
            }
        }
    }
}
