//! Discovery mode: collects findings and open questions across rounds.

use super::string_list;
use loam_core::{SharedLogger, ValidationReport};
use loam_modes::{Mode, ModeContext, ModeDescriptor, ModeError};
use loam_state::{Payload, StateManager};
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEMA_VERSION: &str = "1.0.0";

pub fn descriptor() -> ModeDescriptor {
    let ctor: loam_modes::ModeConstructor =
        Arc::new(|ctx| Ok(Box::new(DiscoveryMode::new(ctx)) as Box<dyn Mode>));
    ModeDescriptor::new("discovery", ctor)
        .with_version(SCHEMA_VERSION)
        .with_priority(90)
        .with_category("workflow")
        .with_tags(["analysis", "questions"])
}

pub struct DiscoveryMode {
    logger: SharedLogger,
    state: StateManager,
    root: std::path::PathBuf,
    round: u64,
    findings: Vec<String>,
    open_questions: Vec<String>,
}

impl DiscoveryMode {
    pub fn new(ctx: ModeContext) -> Self {
        let state = StateManager::new(
            "discovery",
            SCHEMA_VERSION,
            &ctx.root,
            ctx.storage.clone(),
            ctx.logger.clone(),
        );
        Self {
            logger: ctx.logger,
            state,
            root: ctx.root,
            round: 0,
            findings: Vec::new(),
            open_questions: Vec::new(),
        }
    }

    /// Survey the project root: non-hidden entries, split by kind.
    fn survey(&self) -> (usize, usize) {
        let mut files = 0;
        let mut dirs = 0;
        if let Ok(entries) = std::fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                match entry.file_type() {
                    Ok(ft) if ft.is_dir() => dirs += 1,
                    Ok(_) => files += 1,
                    Err(_) => {}
                }
            }
        }
        (files, dirs)
    }

    fn payload(&self) -> Payload {
        let mut data = Payload::new();
        data.insert("round".into(), json!(self.round));
        data.insert("findings".into(), json!(self.findings));
        data.insert("open_questions".into(), json!(self.open_questions));
        data
    }
}

impl Mode for DiscoveryMode {
    fn id(&self) -> &str {
        "discovery"
    }

    fn initialize(&mut self) -> Result<(), ModeError> {
        self.load_state()
    }

    fn configure(&mut self, settings: &Payload) -> Result<(), ModeError> {
        let questions = string_list(settings, "questions");
        for question in questions {
            if !self.open_questions.contains(&question) {
                self.open_questions.push(question);
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<Value, ModeError> {
        self.round += 1;
        let (files, dirs) = self.survey();
        self.findings.push(format!(
            "round {}: project root has {} file(s) and {} directory(ies)",
            self.round, files, dirs
        ));
        self.logger.info(&format!(
            "discovery round {}: {} finding(s), {} open question(s)",
            self.round,
            self.findings.len(),
            self.open_questions.len()
        ));
        Ok(json!({
            "mode": "discovery",
            "round": self.round,
            "findings": self.findings,
            "open_questions": self.open_questions,
        }))
    }

    fn save_state(&mut self) -> Result<(), ModeError> {
        self.state.save(self.payload(), Vec::new())?;
        Ok(())
    }

    fn load_state(&mut self) -> Result<(), ModeError> {
        if let Some(record) = self.state.load()? {
            self.round = record
                .data
                .get("round")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            self.findings = string_list(&record.data, "findings");
            // Keep questions seeded by configure() that the saved state
            // does not know about yet.
            for question in string_list(&record.data, "open_questions") {
                if !self.open_questions.contains(&question) {
                    self.open_questions.push(question);
                }
            }
        }
        Ok(())
    }

    fn clear_state(&mut self) -> Result<(), ModeError> {
        self.state.clear()?;
        self.round = 0;
        self.findings.clear();
        Ok(())
    }

    fn validate(&self) -> ValidationReport {
        ValidationReport::ok()
    }

    fn cleanup(&mut self) -> Result<(), ModeError> {
        self.logger.debug("discovery mode cleaned up");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::NullLogger;
    use loam_state::FsStorage;
    use serde_json::json;
    use tempfile::TempDir;

    fn context(root: &std::path::Path) -> ModeContext {
        ModeContext::new(root, Arc::new(FsStorage), Arc::new(NullLogger))
    }

    #[test]
    fn rounds_survive_restart() {
        let tmp = TempDir::new().unwrap();

        let mut mode = DiscoveryMode::new(context(tmp.path()));
        mode.initialize().unwrap();
        mode.execute().unwrap();
        mode.execute().unwrap();
        mode.save_state().unwrap();

        // A fresh instance (new process) picks up where the last left off.
        let mut revived = DiscoveryMode::new(context(tmp.path()));
        revived.initialize().unwrap();
        let outcome = revived.execute().unwrap();
        assert_eq!(outcome["round"], json!(3));
    }

    #[test]
    fn configured_questions_merge_with_saved_ones() {
        let tmp = TempDir::new().unwrap();

        let mut mode = DiscoveryMode::new(context(tmp.path()));
        let mut settings = Payload::new();
        settings.insert("questions".into(), json!(["what is the scope?"]));
        mode.configure(&settings).unwrap();
        mode.initialize().unwrap();
        mode.save_state().unwrap();

        let mut revived = DiscoveryMode::new(context(tmp.path()));
        let mut settings = Payload::new();
        settings.insert(
            "questions".into(),
            json!(["what is the scope?", "who are the users?"]),
        );
        revived.configure(&settings).unwrap();
        revived.initialize().unwrap();

        let outcome = revived.execute().unwrap();
        assert_eq!(
            outcome["open_questions"],
            json!(["what is the scope?", "who are the users?"])
        );
    }

    #[test]
    fn clear_state_resets_rounds() {
        let tmp = TempDir::new().unwrap();
        let mut mode = DiscoveryMode::new(context(tmp.path()));
        mode.initialize().unwrap();
        mode.execute().unwrap();
        mode.save_state().unwrap();
        mode.clear_state().unwrap();

        let mut revived = DiscoveryMode::new(context(tmp.path()));
        revived.initialize().unwrap();
        let outcome = revived.execute().unwrap();
        assert_eq!(outcome["round"], json!(1));
    }
}
