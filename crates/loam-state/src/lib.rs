//! Durable per-mode state.
//!
//! Each mode instance owns a [`StateManager`] that persists an opaque keyed
//! payload across process restarts. Records are checksummed, gzip-compressed
//! above a size threshold, and written atomically behind a one-deep backup
//! used for crash recovery.
//!
//! Callers must serialize operations per mode identifier; concurrent
//! save/load calls for the same identifier are unsupported.

mod manager;
mod record;
mod storage;

pub use manager::{
    BACKUP_FILE, COMPRESSION_THRESHOLD, STATE_FILE, StateManager, WRITE_RETRIES,
};
pub use record::{Payload, StateRecord, checksum};
pub use storage::{FsStorage, SharedStorage, Storage, WriteOptions};

use thiserror::Error;

/// Error type for state operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid state record: {0}")]
    Codec(String),
    #[error("state record serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },
    #[error("state owned by mode '{found}' loaded by mode '{expected}'")]
    WrongOwner { expected: String, found: String },
    #[error("state for mode '{mode_id}' is corrupted: {reason}")]
    Corrupted { mode_id: String, reason: String },
    #[error("state write for mode '{mode_id}' failed after {attempts} attempts: {source}")]
    WriteFailed {
        mode_id: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("state migration failed: {0}")]
    Migration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
