//! Built-in workflow modes.

mod build;
mod discovery;
mod planning;

pub use build::BuildMode;
pub use discovery::DiscoveryMode;
pub use planning::PlanningMode;

use crate::config::LoamConfig;
use loam_core::SharedLogger;
use loam_modes::{ModeDescriptor, ModeFactory, ModeRegistry};
use loam_state::Payload;

/// Descriptors for every built-in mode.
pub fn builtin_descriptors() -> Vec<ModeDescriptor> {
    vec![
        discovery::descriptor(),
        planning::descriptor(),
        build::descriptor(),
    ]
}

/// Registry pre-loaded with the built-in modes and the config layer applied.
pub fn default_factory(config: &LoamConfig, logger: SharedLogger) -> ModeFactory {
    let mut registry = ModeRegistry::new(logger.clone());
    registry.initialize();
    for descriptor in builtin_descriptors() {
        // Built-in descriptors are well-formed; registration only fails on
        // an empty id.
        let id = descriptor.id.clone();
        if let Err(e) = registry.register(descriptor) {
            logger.error(&format!("failed to register built-in mode '{}': {}", id, e));
        }
    }
    config.apply(&mut registry, &logger);
    ModeFactory::with_registry(registry, logger)
}

/// Read a list of strings out of a settings/payload table.
pub(crate) fn string_list(data: &Payload, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::NullLogger;
    use loam_modes::ModeContext;
    use loam_state::FsStorage;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn builtins_register_and_resolve() {
        let factory = default_factory(&LoamConfig::default(), Arc::new(NullLogger));
        let available = factory.registry().get_available();
        assert_eq!(available, vec!["discovery", "planning", "build"]);
    }

    #[test]
    fn full_chain_creates_through_factory() {
        let tmp = TempDir::new().unwrap();
        let logger: loam_core::SharedLogger = Arc::new(NullLogger);
        let mut factory = default_factory(&LoamConfig::default(), logger.clone());

        // build depends on planning depends on discovery; all enabled, so
        // the chain validates and the instance comes up.
        let ctx = ModeContext::new(tmp.path(), Arc::new(FsStorage), logger);
        factory.create_mode("build", ctx).unwrap();
        assert!(factory.registry().is_live("build"));
    }

    #[test]
    fn disabling_discovery_breaks_the_chain() {
        let tmp = TempDir::new().unwrap();
        let logger: loam_core::SharedLogger = Arc::new(NullLogger);
        let mut factory = default_factory(&LoamConfig::default(), logger.clone());
        factory.registry_mut().set_enabled("discovery", false).unwrap();

        let ctx = ModeContext::new(tmp.path(), Arc::new(FsStorage), logger);
        let err = factory.create_mode("planning", ctx).unwrap_err();
        assert!(err.to_string().contains("discovery"), "{err}");
    }
}
