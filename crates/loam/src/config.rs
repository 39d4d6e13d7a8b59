//! Configuration system for loam.
//!
//! Loads config from:
//! 1. Global: ~/.config/loam/config.toml
//! 2. Per-project: .loam/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [modes.discovery]
//! enabled = true
//! priority = 95
//!
//! [modes.discovery.settings]
//! questions = ["what is the scope?", "who are the users?"]
//!
//! [modes.planning]
//! dependencies = ["discovery"]
//!
//! [modes.build]
//! enabled = false
//! ```

use loam_core::SharedLogger;
use loam_modes::ModeRegistry;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Per-mode override block. Unset fields keep the descriptor's defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ModeOverride {
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub dependencies: Option<Vec<String>>,
    pub settings: Option<toml::Table>,
}

impl ModeOverride {
    /// Later override wins field by field.
    fn merge(self, other: ModeOverride) -> ModeOverride {
        ModeOverride {
            enabled: other.enabled.or(self.enabled),
            priority: other.priority.or(self.priority),
            dependencies: other.dependencies.or(self.dependencies),
            settings: other.settings.or(self.settings),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoamConfig {
    pub modes: HashMap<String, ModeOverride>,
}

impl LoamConfig {
    /// Load configuration for a project.
    ///
    /// Loads global config from ~/.config/loam/config.toml,
    /// then merges with per-project config from .loam/config.toml.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::load_file(&global_path) {
                config = config.merge(global);
            }
        }

        let project_path = root.join(".loam").join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("loam").join("config.toml"))
    }

    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Warning: ignoring invalid config {}: {}", path.display(), e);
                None
            }
        }
    }

    fn merge(mut self, other: LoamConfig) -> LoamConfig {
        for (id, incoming) in other.modes {
            let merged = match self.modes.remove(&id) {
                Some(existing) => existing.merge(incoming),
                None => incoming,
            };
            self.modes.insert(id, merged);
        }
        self
    }

    /// Apply mode overrides to a registry. Overrides naming modes that are
    /// not registered draw a warning and are skipped.
    pub fn apply(&self, registry: &mut ModeRegistry, logger: &SharedLogger) {
        for (id, mode_override) in &self.modes {
            let Some(descriptor) = registry.descriptor(id) else {
                logger.warn(&format!("config references unknown mode '{}'", id));
                continue;
            };

            let mut config = descriptor.config.clone();
            if let Some(enabled) = mode_override.enabled {
                config.enabled = enabled;
            }
            if let Some(deps) = &mode_override.dependencies {
                config.dependencies = deps.clone();
            }
            if let Some(settings) = &mode_override.settings {
                for (key, value) in settings {
                    config.settings.insert(key.clone(), toml_to_json(value));
                }
            }

            // Known-registered id; these cannot fail.
            let _ = registry.update_config(id, config);
            if let Some(priority) = mode_override.priority {
                let _ = registry.set_priority(id, priority);
            }
        }
    }
}

/// Convert a TOML value into its JSON equivalent for mode settings.
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Persist an enabled/disabled flag into the project config file.
pub fn set_mode_enabled(root: &Path, id: &str, enabled: bool) -> std::io::Result<()> {
    let dir = root.join(".loam");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("config.toml");

    let mut table: toml::Table = match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => toml::Table::new(),
    };

    let modes = table
        .entry("modes")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    if let Some(modes) = modes.as_table_mut() {
        let entry = modes
            .entry(id)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if let Some(entry) = entry.as_table_mut() {
            entry.insert("enabled".into(), toml::Value::Boolean(enabled));
        }
    }

    std::fs::write(&path, toml::to_string_pretty(&table).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use loam_core::NullLogger;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(".loam");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn project_config_overrides_descriptor_defaults() {
        let tmp = TempDir::new().unwrap();
        write_project_config(
            tmp.path(),
            r#"
[modes.build]
enabled = false

[modes.discovery]
priority = 95

[modes.discovery.settings]
questions = ["what is the scope?"]
"#,
        );

        let config = LoamConfig::load(tmp.path());
        let logger: SharedLogger = Arc::new(NullLogger);
        let factory = builtin::default_factory(&config, logger);
        let registry = factory.registry();

        assert!(!registry.is_available("build"));
        let discovery = registry.descriptor("discovery").unwrap();
        assert_eq!(discovery.priority, 95);
        assert_eq!(
            discovery.config.settings.get("questions"),
            Some(&serde_json::json!(["what is the scope?"]))
        );
    }

    #[test]
    fn set_mode_enabled_round_trips() {
        let tmp = TempDir::new().unwrap();
        set_mode_enabled(tmp.path(), "build", false).unwrap();

        let config = LoamConfig::load(tmp.path());
        assert_eq!(config.modes["build"].enabled, Some(false));

        set_mode_enabled(tmp.path(), "build", true).unwrap();
        let config = LoamConfig::load(tmp.path());
        assert_eq!(config.modes["build"].enabled, Some(true));
    }

    #[test]
    fn unknown_mode_overrides_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_project_config(tmp.path(), "[modes.ghost]\nenabled = false\n");

        let config = LoamConfig::load(tmp.path());
        let logger: SharedLogger = Arc::new(NullLogger);
        let factory = builtin::default_factory(&config, logger);
        assert_eq!(factory.registry().stats().total, 3);
    }
}
