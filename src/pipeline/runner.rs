//! Registration pipeline implementation.

use crate::config::Settings;
use crate::core::context::RequestContext;
use crate::core::error::{ConfigError, ConfigResult, StepResult};
use crate::core::step::RegistrationStep;
use crate::core::types::RegistrationPayload;
use crate::steps::registry::{StepRegistry, StepServices};
use log::{debug, info};

/// Ordered sequence of registration steps.
///
/// Each step receives the payload returned by the previous one. The first
/// rejection stops the run; later steps are not invoked.
pub struct RegistrationPipeline {
    steps: Vec<(String, Box<dyn RegistrationStep>)>,
}

impl RegistrationPipeline {
    /// Create a pipeline with no steps.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build the pipeline configured for `filter` in `settings`.
    ///
    /// Every step id must be known to `registry`.
    pub fn from_settings(
        settings: &Settings,
        filter: &str,
        registry: &StepRegistry,
        services: &StepServices,
    ) -> ConfigResult<Self> {
        let filter_settings = settings.filter(filter)?;
        let config = filter_settings.step_config();

        let mut pipeline = Self::new();
        for id in &filter_settings.pipeline {
            let step = registry
                .create(id, &config, services)
                .ok_or_else(|| ConfigError::UnknownStep(id.clone()))?;
            pipeline.add_step(step);
        }

        debug!("Built pipeline for '{}' with {} step(s)", filter, pipeline.len());
        Ok(pipeline)
    }

    /// Append a step.
    pub fn add_step(&mut self, step: Box<dyn RegistrationStep>) {
        let id = step.metadata().id;
        self.steps.push((id, step));
    }

    /// Ids of the steps, in execution order.
    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(id, _)| id.as_str())
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order.
    pub fn run(&self, payload: RegistrationPayload, ctx: &RequestContext) -> StepResult<RegistrationPayload> {
        let mut payload = payload;

        for (id, step) in &self.steps {
            debug!("Running registration step '{}'", id);
            payload = step.apply(payload, ctx).map_err(|rejection| {
                info!("Registration step '{}' rejected with '{}'", id, rejection.error_code());
                rejection
            })?;
        }

        Ok(payload)
    }
}

impl Default for RegistrationPipeline {
    fn default() -> Self {
        Self::new()
    }
}
