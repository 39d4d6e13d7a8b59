//! Structured validation outcome.

/// Result of validating a mode instance or a state record.
///
/// Validation failure is an expected, recoverable outcome, so it is reported
/// as a plain value rather than an error: callers inspect `is_valid` and the
/// collected messages. Warnings never flip `is_valid`.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Set when the checked record's schema version differs from the
    /// instance's current version (or is missing entirely).
    pub needs_migration: bool,
    /// Schema version found on the record, if any.
    pub current_version: Option<String>,
    /// Schema version the owning instance expects.
    pub target_version: Option<String>,
}

impl ValidationReport {
    /// A passing report with no findings.
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    /// Record an error and mark the report invalid.
    pub fn error(&mut self, msg: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(msg.into());
    }

    /// Record a warning without affecting validity.
    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.needs_migration |= other.needs_migration;
        if other.current_version.is_some() {
            self.current_version = other.current_version;
        }
        if other.target_version.is_some() {
            self.target_version = other.target_version;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_invalidate() {
        let mut report = ValidationReport::ok();
        report.warn("priority outside usual range");
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn errors_invalidate() {
        let mut report = ValidationReport::ok();
        report.error("empty id");
        assert!(!report.is_valid);
    }

    #[test]
    fn merge_carries_failure() {
        let mut a = ValidationReport::ok();
        let mut b = ValidationReport::ok();
        b.error("bad payload");
        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.errors, vec!["bad payload"]);
    }
}
