use serde::{Deserialize, Serialize};

use crate::id::IntentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "in_progress")]
    InProgress,
    #[serde(alias = "completed")]
    Completed,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Pending => "PENDING",
            IntentStatus::InProgress => "IN_PROGRESS",
            IntentStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    pub name: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub owned_scope: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

impl Intent {
    /// An intent with no owned scope can never authorize a write.
    pub fn authorizes_nothing(&self) -> bool {
        self.owned_scope.iter().all(|entry| entry.trim().is_empty())
    }
}
