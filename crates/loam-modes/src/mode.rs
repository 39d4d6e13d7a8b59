//! Mode capability trait and construction context.

use crate::ModeError;
use loam_core::{SharedLogger, ValidationReport};
use loam_state::{Payload, SharedStorage};
use serde_json::Value;
use std::path::PathBuf;

/// Collaborators injected into a mode at construction.
#[derive(Clone)]
pub struct ModeContext {
    /// Project root the mode operates on.
    pub root: PathBuf,
    /// Persistence primitive for durable state.
    pub storage: SharedStorage,
    /// Fire-and-forget logging sinks.
    pub logger: SharedLogger,
    /// Free-form settings from the descriptor and config layer.
    pub settings: Payload,
}

impl ModeContext {
    pub fn new(root: impl Into<PathBuf>, storage: SharedStorage, logger: SharedLogger) -> Self {
        Self {
            root: root.into(),
            storage,
            logger,
            settings: Payload::new(),
        }
    }

    pub fn with_settings(mut self, settings: Payload) -> Self {
        self.settings = settings;
        self
    }
}

/// Capability set every live mode instance implements.
///
/// Only `id` and `execute` are required; lifecycle hooks default to no-ops.
/// The owning framework calls `before_execute`/`after_execute` around
/// `execute` and `on_error` when any of the three fails.
pub trait Mode: Send {
    /// Identifier this instance was registered under.
    fn id(&self) -> &str;

    /// One-time setup after construction. Typically loads durable state.
    fn initialize(&mut self) -> Result<(), ModeError> {
        Ok(())
    }

    /// Run the mode's work and return a summary value.
    fn execute(&mut self) -> Result<Value, ModeError>;

    /// Release resources. Called on destroy, disable, and unregister.
    fn cleanup(&mut self) -> Result<(), ModeError> {
        Ok(())
    }

    /// Persist the mode's current state.
    fn save_state(&mut self) -> Result<(), ModeError> {
        Ok(())
    }

    /// Restore the mode's state from disk, if any.
    fn load_state(&mut self) -> Result<(), ModeError> {
        Ok(())
    }

    /// Remove the mode's durable state.
    fn clear_state(&mut self) -> Result<(), ModeError> {
        Ok(())
    }

    /// Self-check after construction. An invalid report makes the factory
    /// tear the instance down again.
    fn validate(&self) -> ValidationReport {
        ValidationReport::ok()
    }

    /// Apply free-form settings. Called by the registry right after
    /// construction with the descriptor's settings table.
    fn configure(&mut self, _settings: &Payload) -> Result<(), ModeError> {
        Ok(())
    }

    fn before_execute(&mut self) -> Result<(), ModeError> {
        Ok(())
    }

    fn after_execute(&mut self, _outcome: &Value) -> Result<(), ModeError> {
        Ok(())
    }

    fn on_error(&mut self, _err: &ModeError) {}
}
