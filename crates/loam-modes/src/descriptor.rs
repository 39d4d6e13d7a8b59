//! Registered mode metadata, independent of any live instance.

use crate::mode::{Mode, ModeContext};
use crate::ModeError;
use loam_state::Payload;
use std::sync::Arc;

/// Constructor reference stored in a descriptor.
pub type ModeConstructor =
    Arc<dyn Fn(ModeContext) -> Result<Box<dyn Mode>, ModeError> + Send + Sync>;

/// Per-mode configuration carried by the descriptor.
#[derive(Clone)]
pub struct ModeConfig {
    /// Mode implementation version. Unset draws a registration warning.
    pub version: Option<String>,
    pub enabled: bool,
    /// Identifiers of modes this one depends on. Edges reference
    /// descriptors, not live instances.
    pub dependencies: Vec<String>,
    /// Free-form settings handed to `Mode::configure`.
    pub settings: Payload,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            version: None,
            enabled: true,
            dependencies: Vec::new(),
            settings: Payload::new(),
        }
    }
}

/// Catalog entry: metadata plus a constructor reference.
#[derive(Clone)]
pub struct ModeDescriptor {
    pub id: String,
    pub constructor: ModeConstructor,
    pub config: ModeConfig,
    /// Load priority; the usual range is 0..=100 (higher loads first).
    pub priority: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl ModeDescriptor {
    pub fn new(id: impl Into<String>, constructor: ModeConstructor) -> Self {
        Self {
            id: id.into(),
            constructor,
            config: ModeConfig::default(),
            priority: 50,
            category: None,
            tags: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config.version = Some(version.into());
        self
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }
}

impl std::fmt::Debug for ModeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeDescriptor")
            .field("id", &self.id)
            .field("version", &self.config.version)
            .field("enabled", &self.config.enabled)
            .field("dependencies", &self.config.dependencies)
            .field("priority", &self.priority)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}
