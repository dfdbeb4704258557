use std::path::PathBuf;
use thiserror::Error;

use warden_core::IntentId;
use warden_store::StoreError;

/// Failures that prevent an authorization decision from being made at all.
/// Denials are not errors; see [`crate::DenialReason`].
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("intent store corrupt at {path}: {message}")]
    IntentStoreCorrupt { path: PathBuf, message: String },
    #[error("intent not found: {0}")]
    IntentNotFound(IntentId),
    #[error("intent id {0} is declared more than once in the intent store")]
    DuplicateIntentId(IntentId),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl GovernanceError {
    pub fn kind(&self) -> &'static str {
        match self {
            GovernanceError::IntentStoreCorrupt { .. } => "IntentStoreCorrupt",
            GovernanceError::IntentNotFound(_) => "IntentNotFound",
            GovernanceError::DuplicateIntentId(_) => "DuplicateIntentId",
            GovernanceError::Store(_) => "StoreError",
        }
    }
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IntentStoreCorrupt { path, message } => {
                GovernanceError::IntentStoreCorrupt { path, message }
            }
            StoreError::DuplicateIntentId(id) => GovernanceError::DuplicateIntentId(id),
            other => GovernanceError::Store(other),
        }
    }
}
