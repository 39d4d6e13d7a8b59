//! Create a mode through the factory and drive one execution.

use crate::builtin;
use crate::config::LoamConfig;
use clap::Args;
use loam_modes::{Mode, ModeContext, ModeError};
use loam_state::FsStorage;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Mode to run (e.g. "discovery")
    pub mode: String,

    /// Root directory (defaults to current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Run a mode end to end: create, initialize, execute with hooks, save.
pub fn run(args: RunArgs, verbose: bool) -> i32 {
    let root = super::resolve_root(args.root);
    let logger = super::make_logger(verbose);
    let config = LoamConfig::load(&root);
    let mut factory = builtin::default_factory(&config, logger.clone());

    let ctx = ModeContext::new(&root, Arc::new(FsStorage), logger.clone());
    if let Err(e) = factory.create_mode(&args.mode, ctx) {
        eprintln!("Error: {}", e);
        return 1;
    }

    let registry = factory.registry_mut();
    let outcome = {
        // create_mode succeeded, so the instance is live.
        let instance = registry
            .instance_mut(&args.mode)
            .expect("instance live after create");
        drive(instance)
    };

    if let Err(e) = registry.destroy(&args.mode) {
        logger.error(&format!("cleanup of mode '{}' failed: {}", args.mode, e));
    }

    match outcome {
        Ok(value) => {
            match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", value),
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// The hook sequence the framework runs around `execute`.
fn drive(instance: &mut dyn Mode) -> Result<Value, ModeError> {
    let result = (|| {
        instance.initialize()?;
        instance.before_execute()?;
        let outcome = instance.execute()?;
        instance.after_execute(&outcome)?;
        instance.save_state()?;
        Ok(outcome)
    })();
    if let Err(e) = &result {
        instance.on_error(e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::NullLogger;
    use tempfile::TempDir;

    fn run_in(root: &std::path::Path, mode: &str) -> i32 {
        run(
            RunArgs {
                mode: mode.into(),
                root: Some(root.to_path_buf()),
            },
            false,
        )
    }

    #[test]
    fn run_persists_state_between_invocations() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(run_in(tmp.path(), "discovery"), 0);
        assert_eq!(run_in(tmp.path(), "discovery"), 0);

        let mgr = loam_state::StateManager::new(
            "discovery",
            "1.0.0",
            tmp.path(),
            Arc::new(FsStorage),
            Arc::new(NullLogger),
        );
        let record = mgr.load().unwrap().unwrap();
        assert_eq!(record.data.get("round"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn unknown_mode_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(run_in(tmp.path(), "ghost"), 1);
    }
}
