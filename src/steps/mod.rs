//! Step registry and built-in registration steps.

pub mod builtin;
pub mod registry;

pub use registry::{RegistryEntry, StepFactory, StepRegistry, StepServices};
