use serde::{Deserialize, Serialize};

use warden_core::types::{APPLY_DIFF, INSERT_CONTENT, SEARCH_AND_REPLACE, WRITE_TO_FILE};

use crate::layout::ProjectLayout;
use crate::StoreError;

pub const DEFAULT_SUMMARY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    pub version: u32,
    /// Deny mutating tools when the session has no active intent.
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default = "default_mutating_tools")]
    pub mutating_tools: Vec<String>,
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

fn default_mutating_tools() -> Vec<String> {
    [WRITE_TO_FILE, APPLY_DIFF, INSERT_CONTENT, SEARCH_AND_REPLACE]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_summary_limit() -> usize {
    DEFAULT_SUMMARY_LIMIT
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strict_mode: false,
            mutating_tools: default_mutating_tools(),
            summary_limit: DEFAULT_SUMMARY_LIMIT,
        }
    }
}

impl GovernanceConfig {
    pub fn is_mutating(&self, tool: &str) -> bool {
        self.mutating_tools.iter().any(|t| t == tool)
    }
}

pub fn write_default_config(layout: &ProjectLayout) -> Result<(), StoreError> {
    let config = GovernanceConfig::default();
    let toml_str =
        toml::to_string_pretty(&config).map_err(|e| StoreError::Config(e.to_string()))?;
    std::fs::write(layout.config_file(), toml_str)?;
    Ok(())
}

/// Missing config means defaults; a present but unparsable file is an error.
pub fn read_config(layout: &ProjectLayout) -> Result<GovernanceConfig, StoreError> {
    let path = layout.config_file();
    if !path.exists() {
        return Ok(GovernanceConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let config: GovernanceConfig =
        toml::from_str(&content).map_err(|e| StoreError::Config(e.to_string()))?;
    Ok(config)
}
