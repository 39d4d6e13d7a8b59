//! Mode plugin lifecycle.
//!
//! A *mode* is a pluggable unit with a defined lifecycle
//! (initialize/execute/cleanup) and its own durable state. This crate holds
//! the descriptor catalog ([`ModeRegistry`]), dependency-chain validation
//! ([`DependencyGraph`]), and creation orchestration ([`ModeFactory`]).
//!
//! Callers must serialize create/destroy calls per mode identifier;
//! concurrent calls for the same identifier are unsupported.

mod descriptor;
mod factory;
mod graph;
mod mode;
mod registry;

pub use descriptor::{ModeConfig, ModeConstructor, ModeDescriptor};
pub use factory::ModeFactory;
pub use graph::DependencyGraph;
pub use mode::{Mode, ModeContext};
pub use registry::{ModeRegistry, RegistryStats};

use loam_state::StateError;
use thiserror::Error;

/// Error type for mode lifecycle operations.
#[derive(Debug, Error)]
pub enum ModeError {
    #[error("invalid mode configuration: {0}")]
    Configuration(String),
    #[error("mode '{id}' has missing or disabled dependencies: {}", .missing.join(", "))]
    MissingDependency { id: String, missing: Vec<String> },
    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
    #[error("mode '{0}' is not available")]
    NotAvailable(String),
    #[error("mode '{id}' failed validation: {}", .errors.join("; "))]
    ValidationFailed { id: String, errors: Vec<String> },
    #[error("mode execution failed: {0}")]
    Execution(String),
    #[error(transparent)]
    State(#[from] StateError),
}
