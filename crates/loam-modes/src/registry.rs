//! Catalog of mode descriptors and live instances.

use crate::descriptor::{ModeConfig, ModeDescriptor};
use crate::graph::DependencyGraph;
use crate::mode::{Mode, ModeContext};
use crate::ModeError;
use loam_core::SharedLogger;
use std::collections::{BTreeMap, HashMap};

/// On-demand registry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub enabled: usize,
    pub live: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// Owns the descriptor table and the live-instance table.
///
/// Invariant: the instance table never holds an entry for a disabled or
/// unregistered identifier, and at most one live instance exists per id.
pub struct ModeRegistry {
    descriptors: HashMap<String, ModeDescriptor>,
    instances: HashMap<String, Box<dyn Mode>>,
    logger: SharedLogger,
    initialized: bool,
}

impl ModeRegistry {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            descriptors: HashMap::new(),
            instances: HashMap::new(),
            logger,
            initialized: false,
        }
    }

    /// Idempotent lifecycle entry point. A second call is a logged no-op.
    pub fn initialize(&mut self) {
        if self.initialized {
            self.logger.debug("mode registry already initialized");
            return;
        }
        self.initialized = true;
        self.logger
            .debug(&format!("mode registry initialized ({} modes)", self.descriptors.len()));
    }

    /// Add or replace a descriptor.
    ///
    /// Fails on an empty id. Unset version and out-of-range priority draw
    /// warnings but register anyway; re-registration overwrites with a
    /// warning. Overwriting with a disabled descriptor destroys any live
    /// instance, same as `set_enabled(false)`.
    pub fn register(&mut self, descriptor: ModeDescriptor) -> Result<(), ModeError> {
        if descriptor.id.trim().is_empty() {
            return Err(ModeError::Configuration("mode id is empty".into()));
        }
        if descriptor.config.version.is_none() {
            self.logger
                .warn(&format!("mode '{}' registered without a version", descriptor.id));
        }
        if !(0..=100).contains(&descriptor.priority) {
            self.logger.warn(&format!(
                "mode '{}' priority {} outside usual range 0..=100",
                descriptor.id, descriptor.priority
            ));
        }
        if self.descriptors.contains_key(&descriptor.id) {
            self.logger
                .warn(&format!("mode '{}' re-registered, overwriting", descriptor.id));
        }
        let id = descriptor.id.clone();
        let enabled = descriptor.config.enabled;
        self.descriptors.insert(id.clone(), descriptor);
        // A disabled descriptor must not leave a live instance behind.
        if !enabled {
            if let Err(e) = self.destroy(&id) {
                self.logger
                    .error(&format!("cleanup of disabled mode '{}' failed: {}", id, e));
            }
        }
        Ok(())
    }

    /// Remove a descriptor. A live instance gets best-effort cleanup first;
    /// cleanup failure is logged and never blocks removal. Returns whether
    /// the id was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        if let Some(mut instance) = self.instances.remove(id) {
            if let Err(e) = instance.cleanup() {
                self.logger
                    .error(&format!("cleanup of mode '{}' failed during unregister: {}", id, e));
            }
        }
        self.descriptors.remove(id).is_some()
    }

    /// Construct a live instance for `id` and record it.
    ///
    /// Requires a registered, enabled descriptor and a valid dependency
    /// chain. An existing live instance is replaced (with best-effort
    /// cleanup), never duplicated. The descriptor's settings are merged into
    /// the context and applied through `configure` after construction.
    pub fn create(&mut self, id: &str, context: ModeContext) -> Result<(), ModeError> {
        let descriptor = self
            .descriptors
            .get(id)
            .ok_or_else(|| ModeError::NotAvailable(id.to_string()))?;
        if !descriptor.config.enabled {
            return Err(ModeError::NotAvailable(id.to_string()));
        }

        DependencyGraph::new(&self.descriptors).validate(id)?;

        let descriptor = &self.descriptors[id];
        let mut settings = descriptor.config.settings.clone();
        for (key, value) in &context.settings {
            settings.insert(key.clone(), value.clone());
        }
        let context = context.with_settings(settings.clone());

        let mut instance = (descriptor.constructor)(context)?;
        instance.configure(&settings)?;

        if let Some(mut previous) = self.instances.insert(id.to_string(), instance) {
            self.logger
                .warn(&format!("mode '{}' already live, replacing instance", id));
            if let Err(e) = previous.cleanup() {
                self.logger
                    .error(&format!("cleanup of replaced mode '{}' failed: {}", id, e));
            }
        }
        Ok(())
    }

    /// Tear down the live instance for `id`, if any.
    ///
    /// The instance is removed from the table even when cleanup fails; the
    /// failure is surfaced to the caller.
    pub fn destroy(&mut self, id: &str) -> Result<(), ModeError> {
        match self.instances.remove(id) {
            Some(mut instance) => instance.cleanup(),
            None => Ok(()),
        }
    }

    /// Tear down every live instance, tolerating partial failure.
    /// Returns (destroyed, failed) counts.
    pub fn destroy_all(&mut self) -> (usize, usize) {
        let mut destroyed = 0;
        let mut failed = 0;
        for (id, mut instance) in self.instances.drain() {
            match instance.cleanup() {
                Ok(()) => destroyed += 1,
                Err(e) => {
                    failed += 1;
                    self.logger
                        .error(&format!("cleanup of mode '{}' failed: {}", id, e));
                }
            }
        }
        (destroyed, failed)
    }

    /// Enable or disable a registered mode.
    ///
    /// Disabling destroys a live instance (best-effort, logged); enabling
    /// never auto-creates one.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), ModeError> {
        let descriptor = self
            .descriptors
            .get_mut(id)
            .ok_or_else(|| ModeError::Configuration(format!("mode '{}' is not registered", id)))?;
        descriptor.config.enabled = enabled;
        if !enabled {
            if let Err(e) = self.destroy(id) {
                self.logger
                    .error(&format!("cleanup of disabled mode '{}' failed: {}", id, e));
            }
        }
        Ok(())
    }

    /// Replace the config of a registered mode.
    pub fn update_config(&mut self, id: &str, config: ModeConfig) -> Result<(), ModeError> {
        let descriptor = self
            .descriptors
            .get_mut(id)
            .ok_or_else(|| ModeError::Configuration(format!("mode '{}' is not registered", id)))?;
        let was_enabled = descriptor.config.enabled;
        descriptor.config = config;
        if was_enabled && !descriptor.config.enabled {
            if let Err(e) = self.destroy(id) {
                self.logger
                    .error(&format!("cleanup of disabled mode '{}' failed: {}", id, e));
            }
        }
        Ok(())
    }

    /// Validate the dependency chain reachable from `id`. Advisory; never
    /// mutates registry state.
    pub fn validate_dependencies(&self, id: &str) -> Result<(), ModeError> {
        DependencyGraph::new(&self.descriptors).validate(id)
    }

    /// Transitive dependency identifiers of `id`, depth-first, deduplicated.
    pub fn dependency_chain(&self, id: &str) -> Vec<String> {
        DependencyGraph::new(&self.descriptors).chain(id)
    }

    /// Change the load priority of a registered mode.
    pub fn set_priority(&mut self, id: &str, priority: i32) -> Result<(), ModeError> {
        let descriptor = self
            .descriptors
            .get_mut(id)
            .ok_or_else(|| ModeError::Configuration(format!("mode '{}' is not registered", id)))?;
        if !(0..=100).contains(&priority) {
            self.logger.warn(&format!(
                "mode '{}' priority {} outside usual range 0..=100",
                id, priority
            ));
        }
        descriptor.priority = priority;
        Ok(())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Registered and enabled.
    pub fn is_available(&self, id: &str) -> bool {
        self.descriptors
            .get(id)
            .is_some_and(|d| d.config.enabled)
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    pub fn descriptor(&self, id: &str) -> Option<&ModeDescriptor> {
        self.descriptors.get(id)
    }

    pub(crate) fn descriptor_table(&self) -> &HashMap<String, ModeDescriptor> {
        &self.descriptors
    }

    /// Available mode ids, highest priority first, ties by id.
    pub fn get_available(&self) -> Vec<&str> {
        let mut modes: Vec<&ModeDescriptor> = self
            .descriptors
            .values()
            .filter(|d| d.config.enabled)
            .collect();
        modes.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        modes.into_iter().map(|d| d.id.as_str()).collect()
    }

    /// All descriptors, sorted by id.
    pub fn descriptors(&self) -> Vec<&ModeDescriptor> {
        let mut all: Vec<&ModeDescriptor> = self.descriptors.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn instance_mut(&mut self, id: &str) -> Option<&mut (dyn Mode + '_)> {
        match self.instances.get_mut(id) {
            Some(instance) => Some(instance.as_mut()),
            None => None,
        }
    }

    pub(crate) fn validate_instance(&self, id: &str) -> Option<loam_core::ValidationReport> {
        self.instances.get(id).map(|m| m.validate())
    }

    /// Totals computed on demand.
    pub fn stats(&self) -> RegistryStats {
        let mut by_category = BTreeMap::new();
        for descriptor in self.descriptors.values() {
            let category = descriptor
                .category
                .clone()
                .unwrap_or_else(|| "uncategorized".to_string());
            *by_category.entry(category).or_insert(0) += 1;
        }
        RegistryStats {
            total: self.descriptors.len(),
            enabled: self
                .descriptors
                .values()
                .filter(|d| d.config.enabled)
                .count(),
            live: self.instances.len(),
            by_category,
        }
    }
}
