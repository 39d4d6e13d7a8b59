//! Per-mode state lifecycle: save, load, recover, migrate.

use crate::record::{self, Payload, StateRecord};
use crate::storage::{SharedStorage, WriteOptions};
use crate::StateError;
use loam_core::{SharedLogger, ValidationReport};
use std::path::{Path, PathBuf};

/// Payloads above this size are gzipped on disk.
pub const COMPRESSION_THRESHOLD: usize = 10 * 1024;

/// How many times a failed write is attempted before becoming fatal.
pub const WRITE_RETRIES: u32 = 3;

/// Primary record file name within a mode's state directory.
pub const STATE_FILE: &str = "state.json";

/// Backup of the record that existed before the latest successful save.
pub const BACKUP_FILE: &str = "state.backup.json";

/// Durable state engine for one mode instance.
///
/// Operations for a single mode identifier must be serialized by the caller;
/// there is no internal locking.
pub struct StateManager {
    mode_id: String,
    schema_version: String,
    dir: PathBuf,
    storage: SharedStorage,
    logger: SharedLogger,
    compression_threshold: usize,
    write_retries: u32,
}

impl StateManager {
    /// Create a manager for `mode_id`, persisting under
    /// `<root>/.loam/state/<mode_id>/`.
    pub fn new(
        mode_id: impl Into<String>,
        schema_version: impl Into<String>,
        root: &Path,
        storage: SharedStorage,
        logger: SharedLogger,
    ) -> Self {
        let mode_id = mode_id.into();
        let dir = root.join(".loam").join("state").join(&mode_id);
        Self {
            mode_id,
            schema_version: schema_version.into(),
            dir,
            storage,
            logger,
            compression_threshold: COMPRESSION_THRESHOLD,
            write_retries: WRITE_RETRIES,
        }
    }

    pub fn with_compression_threshold(mut self, threshold: usize) -> Self {
        self.compression_threshold = threshold;
        self
    }

    pub fn with_write_retries(mut self, retries: u32) -> Self {
        self.write_retries = retries.max(1);
        self
    }

    pub fn mode_id(&self) -> &str {
        &self.mode_id
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    fn primary_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE)
    }

    /// Whether a primary record exists on disk.
    pub fn exists(&self) -> bool {
        self.storage.exists(&self.primary_path())
    }

    /// Persist `data` as the new current record.
    ///
    /// Pipeline: stamp owner/timestamp/version, checksum the canonical
    /// payload, compress past the threshold, copy the existing primary to
    /// the backup path, then write atomically with bounded retries.
    pub fn save(&self, data: Payload, artifacts: Vec<String>) -> Result<StateRecord, StateError> {
        let saved_at = chrono::Utc::now().timestamp_millis();
        let mut record = StateRecord {
            id: format!("{}-{}", self.mode_id, saved_at),
            mode_id: self.mode_id.clone(),
            saved_at,
            schema_version: Some(self.schema_version.clone()),
            artifacts,
            data,
            checksum: None,
            compressed: false,
        };
        record.checksum = Some(record::checksum(&record.data)?);

        let (bytes, compressed) = record::encode(&record, self.compression_threshold)?;
        record.compressed = compressed;

        let primary = self.primary_path();
        if self.storage.exists(&primary) {
            self.storage.copy(&primary, &self.backup_path())?;
        }

        self.write_with_retries(&primary, &bytes)?;
        self.logger.debug(&format!(
            "saved state for '{}' ({} bytes{})",
            self.mode_id,
            bytes.len(),
            if compressed { ", compressed" } else { "" }
        ));
        Ok(record)
    }

    fn write_with_retries(&self, path: &Path, bytes: &[u8]) -> Result<(), StateError> {
        let opts = WriteOptions {
            atomic: true,
            create_dirs: true,
        };
        let mut last_err = None;
        for attempt in 1..=self.write_retries {
            match self.storage.write(path, bytes, opts) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempt < self.write_retries {
                        self.logger.warn(&format!(
                            "state write for '{}' failed (attempt {}/{}): {}",
                            self.mode_id, attempt, self.write_retries, e
                        ));
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(StateError::WriteFailed {
            mode_id: self.mode_id.clone(),
            attempts: self.write_retries,
            source: last_err.unwrap_or_else(|| std::io::Error::other("write failed")),
        })
    }

    /// Load the current record, if any, without a migration hook.
    pub fn load(&self) -> Result<Option<StateRecord>, StateError> {
        self.load_with(|_, _| Ok(()))
    }

    /// Load the current record, running `migrate` when the stored schema
    /// version differs from this manager's (a missing version marks legacy
    /// data and also triggers migration).
    ///
    /// Verification failures on the primary degrade to the backup before
    /// becoming [`StateError::Corrupted`]. `migrate` receives the payload
    /// and the stored version; the returned record is re-stamped with the
    /// current version but not re-saved.
    pub fn load_with<F>(&self, migrate: F) -> Result<Option<StateRecord>, StateError>
    where
        F: FnOnce(&mut Payload, Option<&str>) -> Result<(), StateError>,
    {
        let primary = self.primary_path();
        let backup = self.backup_path();

        if !self.storage.exists(&primary) && !self.storage.exists(&backup) {
            return Ok(None);
        }

        let mut record = match self.read_verified(&primary) {
            Ok(record) => record,
            Err(primary_err) => {
                self.logger.warn(&format!(
                    "primary state for '{}' unreadable ({}), falling back to backup",
                    self.mode_id, primary_err
                ));
                self.read_verified(&backup)
                    .map_err(|backup_err| StateError::Corrupted {
                        mode_id: self.mode_id.clone(),
                        reason: format!(
                            "primary: {}; backup: {}",
                            primary_err, backup_err
                        ),
                    })?
            }
        };

        if record.schema_version.as_deref() != Some(self.schema_version.as_str()) {
            let from = record.schema_version.clone();
            self.logger.info(&format!(
                "migrating state for '{}' from {} to {}",
                self.mode_id,
                from.as_deref().unwrap_or("legacy"),
                self.schema_version
            ));
            migrate(&mut record.data, from.as_deref())?;
            record.schema_version = Some(self.schema_version.clone());
            // Keep the checksum invariant after the payload changed.
            record.checksum = Some(record::checksum(&record.data)?);
        }

        Ok(Some(record))
    }

    /// Read and verify the current record without migrating or re-stamping
    /// its schema version. Used for inspection.
    pub fn peek(&self) -> Result<Option<StateRecord>, StateError> {
        let primary = self.primary_path();
        let backup = self.backup_path();
        if !self.storage.exists(&primary) && !self.storage.exists(&backup) {
            return Ok(None);
        }
        match self.read_verified(&primary) {
            Ok(record) => Ok(Some(record)),
            Err(primary_err) => self
                .read_verified(&backup)
                .map(Some)
                .map_err(|backup_err| StateError::Corrupted {
                    mode_id: self.mode_id.clone(),
                    reason: format!("primary: {}; backup: {}", primary_err, backup_err),
                }),
        }
    }

    fn read_verified(&self, path: &Path) -> Result<StateRecord, StateError> {
        let bytes = self.storage.read(path)?;
        let record = record::decode(&bytes)?;

        if record.mode_id != self.mode_id {
            return Err(StateError::WrongOwner {
                expected: self.mode_id.clone(),
                found: record.mode_id,
            });
        }
        if let Some(stored) = &record.checksum {
            let computed = record::checksum(&record.data)?;
            if *stored != computed {
                return Err(StateError::ChecksumMismatch {
                    stored: stored.clone(),
                    computed,
                });
            }
        }
        Ok(record)
    }

    /// Pure structural check of a record against this manager.
    ///
    /// Returns findings instead of failing: an invalid record here is an
    /// expected, recoverable outcome.
    pub fn validate_record(&self, record: &StateRecord) -> ValidationReport {
        let mut report = ValidationReport::ok();
        report.target_version = Some(self.schema_version.clone());
        report.current_version = record.schema_version.clone();

        if record.id.is_empty() {
            report.error("record id is empty");
        }
        if record.mode_id != self.mode_id {
            report.error(format!(
                "record owned by '{}', expected '{}'",
                record.mode_id, self.mode_id
            ));
        }
        if record.checksum.is_none() {
            report.warn("record has no checksum");
        }
        if record.schema_version.as_deref() != Some(self.schema_version.as_str()) {
            report.needs_migration = true;
        }
        report
    }

    /// Remove the primary record and its backup.
    pub fn clear(&self) -> Result<(), StateError> {
        for path in [self.primary_path(), self.backup_path()] {
            if self.storage.exists(&path) {
                self.storage.delete(&path)?;
            }
        }
        Ok(())
    }
}
