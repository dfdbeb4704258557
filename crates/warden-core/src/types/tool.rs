use serde::{Deserialize, Serialize};

use crate::id::IntentId;
use crate::CoreError;

pub const WRITE_TO_FILE: &str = "write_to_file";
pub const APPLY_DIFF: &str = "apply_diff";
pub const INSERT_CONTENT: &str = "insert_content";
pub const SEARCH_AND_REPLACE: &str = "search_and_replace";
pub const READ_FILE: &str = "read_file";
pub const LIST_FILES: &str = "list_files";
pub const SELECT_ACTIVE_INTENT: &str = "select_active_intent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteToFile {
    pub path: String,
    pub content: String,
    /// Digest of the file as the agent last read it, for stale-write detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyDiff {
    pub path: String,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertContent {
    pub path: String,
    pub line: u64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAndReplace {
    pub path: String,
    pub search: String,
    pub replace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathParams {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectParams {
    pub intent_id: IntentId,
}

/// A tool invocation as seen by the hooks. Parameter shapes are fixed per
/// recognized tool; anything else lands in `Unrecognized` and carries no
/// target or payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    WriteToFile(WriteToFile),
    ApplyDiff(ApplyDiff),
    InsertContent(InsertContent),
    SearchAndReplace(SearchAndReplace),
    ReadFile(PathParams),
    ListFiles(PathParams),
    SelectActiveIntent(SelectParams),
    Unrecognized { name: String },
}

impl ToolCall {
    pub fn parse(name: &str, params: serde_json::Value) -> Result<Self, CoreError> {
        fn shape<T: serde::de::DeserializeOwned>(
            name: &str,
            params: serde_json::Value,
        ) -> Result<T, CoreError> {
            serde_json::from_value(params).map_err(|e| CoreError::MalformedParams {
                tool: name.to_string(),
                message: e.to_string(),
            })
        }

        let call = match name {
            WRITE_TO_FILE => ToolCall::WriteToFile(shape(name, params)?),
            APPLY_DIFF => ToolCall::ApplyDiff(shape(name, params)?),
            INSERT_CONTENT => ToolCall::InsertContent(shape(name, params)?),
            SEARCH_AND_REPLACE => ToolCall::SearchAndReplace(shape(name, params)?),
            READ_FILE => ToolCall::ReadFile(shape(name, params)?),
            LIST_FILES => ToolCall::ListFiles(shape(name, params)?),
            SELECT_ACTIVE_INTENT => ToolCall::SelectActiveIntent(shape(name, params)?),
            _ => ToolCall::Unrecognized {
                name: name.to_string(),
            },
        };
        Ok(call)
    }

    pub fn name(&self) -> &str {
        match self {
            ToolCall::WriteToFile(_) => WRITE_TO_FILE,
            ToolCall::ApplyDiff(_) => APPLY_DIFF,
            ToolCall::InsertContent(_) => INSERT_CONTENT,
            ToolCall::SearchAndReplace(_) => SEARCH_AND_REPLACE,
            ToolCall::ReadFile(_) => READ_FILE,
            ToolCall::ListFiles(_) => LIST_FILES,
            ToolCall::SelectActiveIntent(_) => SELECT_ACTIVE_INTENT,
            ToolCall::Unrecognized { name } => name.as_str(),
        }
    }

    /// Path the call acts on, as supplied by the agent (not normalized).
    pub fn target(&self) -> Option<&str> {
        match self {
            ToolCall::WriteToFile(p) => Some(&p.path),
            ToolCall::ApplyDiff(p) => Some(&p.path),
            ToolCall::InsertContent(p) => Some(&p.path),
            ToolCall::SearchAndReplace(p) => Some(&p.path),
            ToolCall::ReadFile(p) | ToolCall::ListFiles(p) => Some(&p.path),
            ToolCall::SelectActiveIntent(_) | ToolCall::Unrecognized { .. } => None,
        }
    }

    /// Bytes the mutation introduces; empty when the tool carries no content.
    pub fn payload(&self) -> &[u8] {
        match self {
            ToolCall::WriteToFile(p) => p.content.as_bytes(),
            ToolCall::ApplyDiff(p) => p.diff.as_bytes(),
            ToolCall::InsertContent(p) => p.content.as_bytes(),
            ToolCall::SearchAndReplace(p) => p.replace.as_bytes(),
            _ => &[],
        }
    }

    pub fn expected_fingerprint(&self) -> Option<&str> {
        match self {
            ToolCall::WriteToFile(p) => p.expected_fingerprint.as_deref(),
            _ => None,
        }
    }
}

/// Outcome reported by the tool implementation after it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default)]
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}
