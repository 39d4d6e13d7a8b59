//! CLI command implementations - one module per top-level command.

pub mod init;
pub mod modes;
pub mod run;
pub mod state;

use loam_core::{LogLevel, SharedLogger, StderrLogger};
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve the project root for a command.
pub(crate) fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Stderr logger honoring the global --verbose flag.
pub(crate) fn make_logger(verbose: bool) -> SharedLogger {
    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    Arc::new(StderrLogger::new(level))
}
