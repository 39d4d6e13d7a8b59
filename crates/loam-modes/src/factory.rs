//! Creation orchestration with compensating teardown.

use crate::graph::DependencyGraph;
use crate::mode::ModeContext;
use crate::registry::ModeRegistry;
use crate::ModeError;
use loam_core::SharedLogger;

/// Orchestrates mode creation: availability check, dependency validation,
/// construction, post-construction validation, teardown on failure.
///
/// Every failure path is compensating; nothing half-created stays in the
/// registry's live table.
pub struct ModeFactory {
    registry: ModeRegistry,
    logger: SharedLogger,
}

impl ModeFactory {
    pub fn new(logger: SharedLogger) -> Self {
        let mut registry = ModeRegistry::new(logger.clone());
        registry.initialize();
        Self { registry, logger }
    }

    pub fn with_registry(registry: ModeRegistry, logger: SharedLogger) -> Self {
        Self { registry, logger }
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModeRegistry {
        &mut self.registry
    }

    /// Create a live instance of `id`.
    ///
    /// Checks run cheapest-first: availability, then the dependency chain,
    /// then construction, then the instance's own `validate()`. A failing
    /// self-check destroys the just-created instance before the error
    /// surfaces.
    pub fn create_mode(&mut self, id: &str, context: ModeContext) -> Result<(), ModeError> {
        if !self.registry.is_available(id) {
            return Err(ModeError::NotAvailable(id.to_string()));
        }

        DependencyGraph::new(self.registry.descriptor_table()).validate(id)?;

        self.registry.create(id, context)?;

        let report = self
            .registry
            .validate_instance(id)
            .unwrap_or_else(loam_core::ValidationReport::ok);
        if !report.is_valid {
            if let Err(e) = self.registry.destroy(id) {
                self.logger
                    .error(&format!("teardown of invalid mode '{}' failed: {}", id, e));
            }
            return Err(ModeError::ValidationFailed {
                id: id.to_string(),
                errors: report.errors,
            });
        }
        for warning in &report.warnings {
            self.logger.warn(&format!("mode '{}': {}", id, warning));
        }

        self.logger.debug(&format!("mode '{}' created", id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModeDescriptor;
    use crate::mode::Mode;
    use loam_core::{NullLogger, ValidationReport};
    use loam_state::FsStorage;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct StubMode {
        id: &'static str,
        valid: bool,
    }

    impl Mode for StubMode {
        fn id(&self) -> &str {
            self.id
        }
        fn execute(&mut self) -> Result<Value, ModeError> {
            Ok(json!({}))
        }
        fn validate(&self) -> ValidationReport {
            if self.valid {
                ValidationReport::ok()
            } else {
                let mut report = ValidationReport::ok();
                report.error("stub refuses to run");
                report
            }
        }
    }

    fn descriptor(id: &'static str, valid: bool) -> ModeDescriptor {
        let ctor: crate::ModeConstructor =
            Arc::new(move |_ctx| Ok(Box::new(StubMode { id, valid }) as Box<dyn Mode>));
        ModeDescriptor::new(id, ctor).with_version("1.0.0")
    }

    fn context() -> ModeContext {
        ModeContext::new("/tmp", Arc::new(FsStorage), Arc::new(NullLogger))
    }

    #[test]
    fn unknown_mode_is_not_available() {
        let mut factory = ModeFactory::new(Arc::new(NullLogger));
        assert!(matches!(
            factory.create_mode("ghost", context()).unwrap_err(),
            ModeError::NotAvailable(_)
        ));
    }

    #[test]
    fn dependency_failure_precedes_construction() {
        let mut factory = ModeFactory::new(Arc::new(NullLogger));
        factory
            .registry_mut()
            .register(descriptor("alpha", true).with_dependencies(["beta"]))
            .unwrap();

        assert!(matches!(
            factory.create_mode("alpha", context()).unwrap_err(),
            ModeError::MissingDependency { .. }
        ));
        assert!(!factory.registry().is_live("alpha"));
    }

    #[test]
    fn failed_self_check_tears_the_instance_down() {
        let mut factory = ModeFactory::new(Arc::new(NullLogger));
        factory.registry_mut().register(descriptor("flaky", false)).unwrap();

        let err = factory.create_mode("flaky", context()).unwrap_err();
        let ModeError::ValidationFailed { id, errors } = err else {
            panic!("expected validation failure");
        };
        assert_eq!(id, "flaky");
        assert_eq!(errors, vec!["stub refuses to run"]);
        // No leaked live entry.
        assert!(!factory.registry().is_live("flaky"));
    }

    #[test]
    fn successful_create_leaves_a_live_instance() {
        let mut factory = ModeFactory::new(Arc::new(NullLogger));
        factory.registry_mut().register(descriptor("solid", true)).unwrap();

        factory.create_mode("solid", context()).unwrap();
        assert!(factory.registry().is_live("solid"));
        let outcome = factory
            .registry_mut()
            .instance_mut("solid")
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(outcome, json!({}));
    }

    #[test]
    fn cycle_is_reported_with_the_exact_sequence() {
        let mut factory = ModeFactory::new(Arc::new(NullLogger));
        factory
            .registry_mut()
            .register(descriptor("a", true).with_dependencies(["b"]))
            .unwrap();
        factory
            .registry_mut()
            .register(descriptor("b", true).with_dependencies(["c"]))
            .unwrap();
        factory
            .registry_mut()
            .register(descriptor("c", true).with_dependencies(["a"]))
            .unwrap();

        let err = factory.create_mode("a", context()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "circular dependency detected: a -> b -> c -> a"
        );
    }
}
