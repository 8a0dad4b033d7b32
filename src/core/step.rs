//! RegistrationStep trait and step metadata.
//!
//! A step is one policy check in the registration pipeline. It either hands
//! the payload back (allow) or returns a `Rejection` (veto). There is no
//! third outcome: anything a step cannot decide is resolved inside the step.

use crate::core::context::RequestContext;
use crate::core::error::StepResult;
use crate::core::types::RegistrationPayload;
use serde::{Deserialize, Serialize};

/// Metadata describing a step type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetadata {
    /// Stable identifier used in pipeline configuration (e.g. "forbidden_username")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Detailed description
    pub description: String,
    /// Configuration options the step reads
    pub options: Vec<String>,
    /// Error codes the step may reject with
    pub error_codes: Vec<String>,
}

impl StepMetadata {
    /// Start building metadata.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> StepMetadataBuilder {
        StepMetadataBuilder {
            metadata: StepMetadata {
                id: id.into(),
                name: name.into(),
                description: String::new(),
                options: Vec::new(),
                error_codes: Vec::new(),
            },
        }
    }
}

/// Builder for [`StepMetadata`].
pub struct StepMetadataBuilder {
    metadata: StepMetadata,
}

impl StepMetadataBuilder {
    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    /// Declare a configuration option.
    pub fn option(mut self, name: impl Into<String>) -> Self {
        self.metadata.options.push(name.into());
        self
    }

    /// Declare an error code.
    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.metadata.error_codes.push(code.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> StepMetadata {
        self.metadata
    }
}

/// A single policy check run during registration.
///
/// Implementations hold only immutable configuration and shared capabilities,
/// so one instance may serve concurrent requests.
pub trait RegistrationStep: Send + Sync {
    /// Describe this step.
    fn metadata(&self) -> StepMetadata;

    /// Run the check.
    ///
    /// Returns the payload (same keys or a superset) to continue the
    /// pipeline, or a [`Rejection`](crate::core::error::Rejection) to halt it.
    fn apply(&self, payload: RegistrationPayload, ctx: &RequestContext) -> StepResult<RegistrationPayload>;
}

/// A step that allows every registration unchanged.
///
/// Placeholder for pipelines that should run no checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RegistrationStep for AllowAll {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::builder("allow_all", "Allow All")
            .description("Accepts every registration without changes")
            .build()
    }

    fn apply(&self, payload: RegistrationPayload, _ctx: &RequestContext) -> StepResult<RegistrationPayload> {
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let metadata = StepMetadata::builder("demo", "Demo")
            .description("A demo step")
            .option("terms")
            .error_code("demo-failed")
            .build();
        assert_eq!(metadata.id, "demo");
        assert_eq!(metadata.options, vec!["terms"]);
        assert_eq!(metadata.error_codes, vec!["demo-failed"]);
    }

    #[test]
    fn test_allow_all_returns_payload() {
        let payload = RegistrationPayload::new().with("username", "x");
        let out = AllowAll.apply(payload.clone(), &RequestContext::default()).unwrap();
        assert_eq!(out, payload);
    }
}
