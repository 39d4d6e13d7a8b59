//! Planning mode: maintains an ordered plan and tracks completed steps.
//!
//! Schema 2.0.0 stores the plan under a `plan` object with separate `steps`
//! and `done` lists. 1.x records carried a flat `steps` list; loading one
//! runs the migration below.

use super::string_list;
use loam_core::{SharedLogger, ValidationReport};
use loam_modes::{Mode, ModeContext, ModeDescriptor, ModeError};
use loam_state::{Payload, StateError, StateManager};
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEMA_VERSION: &str = "2.0.0";

pub fn descriptor() -> ModeDescriptor {
    let ctor: loam_modes::ModeConstructor =
        Arc::new(|ctx| Ok(Box::new(PlanningMode::new(ctx)) as Box<dyn Mode>));
    ModeDescriptor::new("planning", ctor)
        .with_version(SCHEMA_VERSION)
        .with_priority(80)
        .with_dependencies(["discovery"])
        .with_category("workflow")
        .with_tags(["plan"])
}

/// Lift a 1.x payload (flat `steps` list) into the 2.0.0 layout.
fn migrate_plan(data: &mut Payload, _from: Option<&str>) -> Result<(), StateError> {
    let steps = data.remove("steps").unwrap_or_else(|| json!([]));
    data.insert("plan".into(), json!({ "steps": steps, "done": [] }));
    Ok(())
}

pub struct PlanningMode {
    logger: SharedLogger,
    state: StateManager,
    steps: Vec<String>,
    done: Vec<String>,
}

impl PlanningMode {
    pub fn new(ctx: ModeContext) -> Self {
        let state = StateManager::new(
            "planning",
            SCHEMA_VERSION,
            &ctx.root,
            ctx.storage.clone(),
            ctx.logger.clone(),
        );
        Self {
            logger: ctx.logger,
            state,
            steps: Vec::new(),
            done: Vec::new(),
        }
    }

    fn payload(&self) -> Payload {
        let mut data = Payload::new();
        data.insert(
            "plan".into(),
            json!({ "steps": self.steps, "done": self.done }),
        );
        data
    }

    fn next_step(&self) -> Option<&String> {
        self.steps.iter().find(|s| !self.done.contains(s))
    }
}

impl Mode for PlanningMode {
    fn id(&self) -> &str {
        "planning"
    }

    fn initialize(&mut self) -> Result<(), ModeError> {
        self.load_state()
    }

    fn configure(&mut self, settings: &Payload) -> Result<(), ModeError> {
        for step in string_list(settings, "steps") {
            if !self.steps.contains(&step) {
                self.steps.push(step);
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<Value, ModeError> {
        let completed = match self.next_step().cloned() {
            Some(step) => {
                self.logger.info(&format!("completed plan step: {}", step));
                self.done.push(step.clone());
                Some(step)
            }
            None => {
                self.logger.info("plan has no remaining steps");
                None
            }
        };
        Ok(json!({
            "mode": "planning",
            "completed": completed,
            "remaining": self.steps.len().saturating_sub(self.done.len()),
            "plan": { "steps": self.steps, "done": self.done },
        }))
    }

    fn save_state(&mut self) -> Result<(), ModeError> {
        self.state.save(self.payload(), Vec::new())?;
        Ok(())
    }

    fn load_state(&mut self) -> Result<(), ModeError> {
        if let Some(record) = self.state.load_with(migrate_plan)? {
            let plan = record.data.get("plan").cloned().unwrap_or_else(|| json!({}));
            let stored: Payload = plan.as_object().cloned().unwrap_or_default();
            for step in string_list(&stored, "steps") {
                if !self.steps.contains(&step) {
                    self.steps.push(step);
                }
            }
            self.done = string_list(&stored, "done");
        }
        Ok(())
    }

    fn clear_state(&mut self) -> Result<(), ModeError> {
        self.state.clear()?;
        self.done.clear();
        Ok(())
    }

    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if self.done.iter().any(|d| !self.steps.contains(d)) {
            report.error("done list references steps not in the plan");
        }
        if self.steps.is_empty() {
            report.warn("plan has no steps configured");
        }
        report
    }

    fn cleanup(&mut self) -> Result<(), ModeError> {
        self.logger.debug("planning mode cleaned up");
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

    fn configured(root: &std::path::Path, steps: &[&str]) -> PlanningMode {
        let mut mode = PlanningMode::new(context(root));
        let mut settings = Payload::new();
        settings.insert("steps".into(), json!(steps));
        mode.configure(&settings).unwrap();
        mode
    }

    #[test]
    fn steps_complete_in_order_across_restarts() {
        let tmp = TempDir::new().unwrap();

        let mut mode = configured(tmp.path(), &["outline", "estimate"]);
        mode.initialize().unwrap();
        let outcome = mode.execute().unwrap();
        assert_eq!(outcome["completed"], json!("outline"));
        mode.save_state().unwrap();

        let mut revived = configured(tmp.path(), &["outline", "estimate"]);
        revived.initialize().unwrap();
        let outcome = revived.execute().unwrap();
        assert_eq!(outcome["completed"], json!("estimate"));
        assert_eq!(outcome["remaining"], json!(0));
    }

    #[test]
    fn legacy_record_migrates_to_plan_layout() {
        let tmp = TempDir::new().unwrap();

        // Write a 1.0.0-era record: flat steps list, no plan object.
        let legacy = StateManager::new(
            "planning",
            "1.0.0",
            tmp.path(),
            Arc::new(FsStorage),
            Arc::new(NullLogger),
        );
        let mut data = Payload::new();
        data.insert("steps".into(), json!(["outline", "estimate"]));
        legacy.save(data, Vec::new()).unwrap();

        let mut mode = PlanningMode::new(context(tmp.path()));
        mode.initialize().unwrap();
        assert_eq!(mode.steps, vec!["outline", "estimate"]);
        assert!(mode.done.is_empty());

        let outcome = mode.execute().unwrap();
        assert_eq!(outcome["completed"], json!("outline"));
    }

    #[test]
    fn validate_rejects_inconsistent_done_list() {
        let tmp = TempDir::new().unwrap();
        let mut mode = configured(tmp.path(), &["outline"]);
        mode.done.push("phantom".into());
        assert!(!mode.validate().is_valid);
    }
}
