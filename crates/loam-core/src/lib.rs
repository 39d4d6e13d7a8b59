//! Shared types and utilities for loam crates.

mod logger;
mod validation;

pub use logger::{LogLevel, Logger, NullLogger, SharedLogger, StderrLogger};
pub use validation::ValidationReport;
