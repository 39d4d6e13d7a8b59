//! Inspect and manage registered modes.

use crate::builtin;
use crate::config::{self, LoamConfig};
use clap::Subcommand;
use loam_modes::ModeRegistry;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum ModesAction {
    /// List registered modes
    List,
    /// Enable a mode (persisted to .loam/config.toml)
    Enable { id: String },
    /// Disable a mode (persisted to .loam/config.toml)
    Disable { id: String },
    /// Show registry statistics
    Stats,
    /// Validate and print a mode's dependency chain
    Deps { id: String },
}

/// Run modes command.
pub fn run(action: ModesAction, root: Option<PathBuf>, verbose: bool) -> i32 {
    let root = super::resolve_root(root);
    let logger = super::make_logger(verbose);
    let config = LoamConfig::load(&root);
    let factory = builtin::default_factory(&config, logger);
    let registry = factory.registry();

    match action {
        ModesAction::List => list(registry),
        ModesAction::Enable { id } => set_enabled(&root, registry, &id, true),
        ModesAction::Disable { id } => set_enabled(&root, registry, &id, false),
        ModesAction::Stats => stats(registry),
        ModesAction::Deps { id } => deps(registry, &id),
    }
}

fn list(registry: &ModeRegistry) -> i32 {
    for descriptor in registry.descriptors() {
        let status = if descriptor.config.enabled {
            "enabled"
        } else {
            "disabled"
        };
        println!(
            "{:<12} {:<8} {:<9} priority {:>3}  [{}]",
            descriptor.id,
            descriptor.config.version.as_deref().unwrap_or("?"),
            status,
            descriptor.priority,
            descriptor.category.as_deref().unwrap_or("-")
        );
        if !descriptor.config.dependencies.is_empty() {
            println!(
                "             depends on: {}",
                descriptor.config.dependencies.join(", ")
            );
        }
    }
    0
}

fn stats(registry: &ModeRegistry) -> i32 {
    let stats = registry.stats();
    println!(
        "Modes: {} total, {} enabled, {} live",
        stats.total, stats.enabled, stats.live
    );
    for (category, count) in &stats.by_category {
        println!("  {}: {}", category, count);
    }
    0
}

fn deps(registry: &ModeRegistry, id: &str) -> i32 {
    match registry.validate_dependencies(id) {
        Ok(()) => {
            let chain = registry.dependency_chain(id);
            if chain.is_empty() {
                println!("{}: no dependencies", id);
            } else {
                println!("{} -> {}", id, chain.join(" -> "));
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn set_enabled(root: &Path, registry: &ModeRegistry, id: &str, enabled: bool) -> i32 {
    if !registry.is_registered(id) {
        eprintln!("Error: mode '{}' is not registered", id);
        return 1;
    }
    if let Err(e) = config::set_mode_enabled(root, id, enabled) {
        eprintln!("Failed to update config: {}", e);
        return 1;
    }
    println!(
        "Mode '{}' {}",
        id,
        if enabled { "enabled" } else { "disabled" }
    );
    0
}
