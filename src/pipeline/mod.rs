//! Pipeline runner for registration steps.
//!
//! Hosts with their own runner only need [`RegistrationStep`](crate::core::step::RegistrationStep);
//! this runner is provided for standalone use.

pub mod runner;

pub use runner::RegistrationPipeline;
