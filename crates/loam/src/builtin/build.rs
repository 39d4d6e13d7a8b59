//! Build mode: works through a task checklist, one task per run.

use super::string_list;
use loam_core::{SharedLogger, ValidationReport};
use loam_modes::{Mode, ModeContext, ModeDescriptor, ModeError};
use loam_state::{Payload, StateManager};
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEMA_VERSION: &str = "1.0.0";

pub fn descriptor() -> ModeDescriptor {
    let ctor: loam_modes::ModeConstructor =
        Arc::new(|ctx| Ok(Box::new(BuildMode::new(ctx)) as Box<dyn Mode>));
    ModeDescriptor::new("build", ctor)
        .with_version(SCHEMA_VERSION)
        .with_priority(70)
        .with_dependencies(["planning"])
        .with_category("workflow")
        .with_tags(["tasks"])
}

pub struct BuildMode {
    logger: SharedLogger,
    state: StateManager,
    tasks: Vec<String>,
    completed: Vec<String>,
    artifacts: Vec<String>,
}

impl BuildMode {
    pub fn new(ctx: ModeContext) -> Self {
        let state = StateManager::new(
            "build",
            SCHEMA_VERSION,
            &ctx.root,
            ctx.storage.clone(),
            ctx.logger.clone(),
        );
        Self {
            logger: ctx.logger,
            state,
            tasks: Vec::new(),
            completed: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    fn payload(&self) -> Payload {
        let mut data = Payload::new();
        data.insert("tasks".into(), json!(self.tasks));
        data.insert("completed".into(), json!(self.completed));
        data
    }
}

impl Mode for BuildMode {
    fn id(&self) -> &str {
        "build"
    }

    fn initialize(&mut self) -> Result<(), ModeError> {
        self.load_state()
    }

    fn configure(&mut self, settings: &Payload) -> Result<(), ModeError> {
        for task in string_list(settings, "tasks") {
            if !self.tasks.contains(&task) {
                self.tasks.push(task);
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<Value, ModeError> {
        let next = self
            .tasks
            .iter()
            .find(|t| !self.completed.contains(t))
            .cloned();
        if let Some(task) = &next {
            self.completed.push(task.clone());
            self.artifacts.push(format!("build/{}.log", task));
            self.logger.info(&format!("completed build task: {}", task));
        }
        Ok(json!({
            "mode": "build",
            "completed": next,
            "remaining": self.tasks.len().saturating_sub(self.completed.len()),
        }))
    }

    fn save_state(&mut self) -> Result<(), ModeError> {
        self.state.save(self.payload(), self.artifacts.clone())?;
        Ok(())
    }

    fn load_state(&mut self) -> Result<(), ModeError> {
        if let Some(record) = self.state.load()? {
            for task in string_list(&record.data, "tasks") {
                if !self.tasks.contains(&task) {
                    self.tasks.push(task);
                }
            }
            self.completed = string_list(&record.data, "completed");
            self.artifacts = record.artifacts;
        }
        Ok(())
    }

    fn clear_state(&mut self) -> Result<(), ModeError> {
        self.state.clear()?;
        self.completed.clear();
        self.artifacts.clear();
        Ok(())
    }

    fn validate(&self) -> ValidationReport {
        ValidationReport::ok()
    }

    fn cleanup(&mut self) -> Result<(), ModeError> {
        self.logger.debug("build mode cleaned up");
        Ok(())
    }
}
