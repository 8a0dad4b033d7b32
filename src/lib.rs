//! # signup-guard - Registration pipeline steps
//!
//! signup-guard provides policy checks that run synchronously while a learner
//! registers and may veto the registration before the account is created.
//!
//! ## Features
//!
//! - **Short-circuiting pipeline**: steps run in order and the first rejection stops the run
//! - **Structured rejections**: every veto carries a message, a status code and a stable error code
//! - **Fail-open verification**: only a definitive negative answer blocks a registration
//! - **Pluggable**: implement [`RegistrationStep`](core::step::RegistrationStep) and register a factory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use signup_guard::prelude::*;
//!
//! let settings = Settings::from_file("signup-guard.toml")?;
//! let services = StepServices::from_settings(&settings);
//! let registry = StepRegistry::with_builtins();
//! let pipeline = RegistrationPipeline::from_settings(&settings, REGISTRATION_REQUESTED, &registry, &services)?;
//!
//! let payload = RegistrationPayload::new()
//!     .with("username", "learner42")
//!     .with("recaptcha_token", token);
//! let ctx = RequestContext::new().with_header("Mobile-Platform-Identifier", "ios");
//!
//! match pipeline.run(payload, &ctx) {
//!     Ok(payload) => create_account(payload),
//!     Err(rejection) => respond(rejection.status_code(), rejection.message()),
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Payload, rejection, request context, toggles and the step trait
//! - [`steps`]: Step registry and built-in steps
//! - [`recaptcha`]: Token verification capability and its HTTP backend
//! - [`pipeline`]: Reference pipeline runner
//! - [`config`]: TOML settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod pipeline;
pub mod recaptcha;
pub mod steps;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use signup_guard::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::context::RequestContext;
    pub use crate::core::step::{AllowAll, RegistrationStep, StepMetadata};
    pub use crate::core::toggles::{FeatureToggles, ToggleStore, ENABLE_RECAPTCHA_VALIDATION};
    pub use crate::core::types::{RegistrationPayload, StepConfig};

    // Errors
    pub use crate::core::error::{
        BackendError, ConfigError, RecaptchaError, Rejection, StepResult,
    };

    // Settings
    pub use crate::config::{FilterSettings, RecaptchaSettings, Settings, REGISTRATION_REQUESTED};

    // Verification
    pub use crate::recaptcha::{
        AssessmentBackend, HttpAssessmentBackend, RecaptchaVerifier, TokenProperties, TokenVerifier,
        VerificationOutcome,
    };

    // Steps
    pub use crate::steps::builtin::{PreventForbiddenUsername, VerifyRecaptchaToken};
    pub use crate::steps::registry::{StepRegistry, StepServices};

    // Pipeline
    pub use crate::pipeline::RegistrationPipeline;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
