use std::path::{Path, PathBuf};

use crate::StoreError;

pub const ORCHESTRATION_DIR: &str = ".orchestration";

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn orchestration_dir(&self) -> PathBuf {
        self.root.join(ORCHESTRATION_DIR)
    }

    pub fn intents_file(&self) -> PathBuf {
        self.orchestration_dir().join("active_intents.yaml")
    }

    pub fn trace_file(&self) -> PathBuf {
        self.orchestration_dir().join("agent_trace.jsonl")
    }

    pub fn config_file(&self) -> PathBuf {
        self.orchestration_dir().join("governance.toml")
    }

    pub fn create_dirs(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.orchestration_dir())?;
        Ok(())
    }
}
