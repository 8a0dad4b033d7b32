//! Core types and traits for signup-guard.
//!
//! This module contains the fundamental building blocks:
//! - Error types and the rejection signal
//! - Registration payload and step configuration
//! - Request context and feature toggles
//! - The RegistrationStep trait

pub mod context;
pub mod error;
pub mod step;
pub mod toggles;
pub mod types;

pub use context::RequestContext;
pub use error::{BackendError, ConfigError, RecaptchaError, Rejection, StepResult};
pub use step::{AllowAll, RegistrationStep, StepMetadata};
pub use toggles::{FeatureToggles, ToggleStore};
pub use types::{RegistrationPayload, StepConfig};
