//! Inspect and clear durable mode state.

use clap::Subcommand;
use loam_state::{FsStorage, StateManager};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub enum StateAction {
    /// Show the persisted record for a mode
    Show { id: String },
    /// Remove a mode's persisted state and its backup
    Clear { id: String },
}

/// Run state command.
pub fn run(action: StateAction, root: Option<PathBuf>, verbose: bool) -> i32 {
    let root = super::resolve_root(root);
    let logger = super::make_logger(verbose);

    match action {
        StateAction::Show { id } => {
            // Inspection does not migrate, so the schema version here is
            // irrelevant; peek() reports the record as stored.
            let mgr = StateManager::new(&id, "0", &root, Arc::new(FsStorage), logger);
            match mgr.peek() {
                Ok(Some(record)) => {
                    println!("id:             {}", record.id);
                    println!("mode:           {}", record.mode_id);
                    println!("saved at:       {}", format_timestamp(record.saved_at));
                    println!(
                        "schema version: {}",
                        record.schema_version.as_deref().unwrap_or("legacy")
                    );
                    println!(
                        "checksum:       {}",
                        record.checksum.as_deref().unwrap_or("-")
                    );
                    println!("compressed:     {}", record.compressed);
                    if !record.artifacts.is_empty() {
                        println!("artifacts:      {}", record.artifacts.join(", "));
                    }
                    match serde_json::to_string_pretty(&record.data) {
                        Ok(text) => println!("{}", text),
                        Err(e) => eprintln!("Failed to render payload: {}", e),
                    }
                    0
                }
                Ok(None) => {
                    println!("No state for mode '{}'.", id);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        StateAction::Clear { id } => {
            let mgr = StateManager::new(&id, "0", &root, Arc::new(FsStorage), logger);
            match mgr.clear() {
                Ok(()) => {
                    println!("Cleared state for mode '{}'.", id);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}
