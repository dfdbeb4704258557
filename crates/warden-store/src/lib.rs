pub mod config;
pub mod error;
pub mod intents;
pub mod layout;
pub mod lockfile;
pub mod trace;

pub use config::GovernanceConfig;
pub use error::StoreError;
pub use intents::{IntegrityIssue, IntentSet, IntentStore};
pub use trace::{TraceProblem, TraceVerification, TraceWriter};

use std::path::Path;

use warden_core::types::TraceRecord;

use crate::layout::ProjectLayout;

const INTENTS_TEMPLATE: &str = "\
# Declare units of authorized work here. Agents must select one before writing.
#
# active_intents:
#   - id: \"INT-001\"
#     name: \"Example intent\"
#     status: \"IN_PROGRESS\"
#     owned_scope:
#       - \"src/\"
#     constraints: []
#     acceptance_criteria: []
active_intents: []
";

/// Handle on a project's `.orchestration` directory.
pub struct ProjectStore {
    layout: ProjectLayout,
}

impl ProjectStore {
    /// Create the orchestration directory and write defaults for any file
    /// that does not exist yet. Existing files are left alone.
    pub fn init(root: &Path) -> Result<Self, StoreError> {
        let layout = ProjectLayout::new(root);
        layout.create_dirs()?;
        if !layout.config_file().exists() {
            config::write_default_config(&layout)?;
        }
        if !layout.intents_file().exists() {
            std::fs::write(layout.intents_file(), INTENTS_TEMPLATE)?;
        }
        Ok(Self { layout })
    }

    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let layout = ProjectLayout::new(root);
        if !layout.orchestration_dir().is_dir() {
            return Err(StoreError::NotInitialized(root.to_path_buf()));
        }
        Ok(Self { layout })
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn config(&self) -> Result<GovernanceConfig, StoreError> {
        config::read_config(&self.layout)
    }

    pub fn intents(&self) -> IntentStore {
        IntentStore::new(&self.layout.intents_file())
    }

    pub fn trace_writer(&self) -> TraceWriter {
        TraceWriter::new(&self.layout.trace_file())
    }

    pub fn read_trace(&self) -> Result<Vec<TraceRecord>, StoreError> {
        trace::read_trace(&self.layout.trace_file())
    }

    pub fn verify_trace(&self) -> Result<TraceVerification, StoreError> {
        trace::verify_trace(&self.layout.trace_file())
    }
}
