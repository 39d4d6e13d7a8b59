//! Logging sink consumed by the mode and state crates.
//!
//! Four severities, fire-and-forget: sinks never return errors and callers
//! never wait on them. Collaborators receive a `SharedLogger` at construction
//! instead of writing to stderr directly, which keeps tests quiet.

use nu_ansi_term::Color::{LightCyan, Red, Yellow};
use std::sync::Arc;

/// Minimum severity a logger will emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Severity-sink logging interface.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Shared handle passed to every collaborator.
pub type SharedLogger = Arc<dyn Logger>;

/// Logger that writes tagged lines to stderr.
pub struct StderrLogger {
    min_level: LogLevel,
    color: bool,
}

impl StderrLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
            color: std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }

    fn emit(&self, level: LogLevel, tag: &str, msg: &str) {
        if level < self.min_level {
            return;
        }
        if self.color {
            let painted = match level {
                LogLevel::Debug => LightCyan.dimmed().paint(tag),
                LogLevel::Info => LightCyan.paint(tag),
                LogLevel::Warn => Yellow.paint(tag),
                LogLevel::Error => Red.paint(tag),
            };
            eprintln!("{} {}", painted, msg);
        } else {
            eprintln!("{} {}", tag, msg);
        }
    }
}

impl Logger for StderrLogger {
    fn debug(&self, msg: &str) {
        self.emit(LogLevel::Debug, "debug:", msg);
    }

    fn info(&self, msg: &str) {
        self.emit(LogLevel::Info, "info:", msg);
    }

    fn warn(&self, msg: &str) {
        self.emit(LogLevel::Warn, "warning:", msg);
    }

    fn error(&self, msg: &str) {
        self.emit(LogLevel::Error, "error:", msg);
    }
}

/// Logger that discards everything. Used in tests.
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn null_logger_is_silent() {
        let logger: SharedLogger = Arc::new(NullLogger);
        logger.debug("nothing");
        logger.error("still nothing");
    }
}
