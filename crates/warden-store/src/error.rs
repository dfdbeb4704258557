use std::path::PathBuf;
use thiserror::Error;

use warden_core::IntentId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not a governed project: {0}")]
    NotInitialized(PathBuf),
    #[error("intent store corrupt at {path}: {message}")]
    IntentStoreCorrupt { path: PathBuf, message: String },
    #[error("duplicate intent id in store: {0}")]
    DuplicateIntentId(IntentId),
    #[error("trace log corrupt at line {line}: {message}")]
    TraceCorrupt { line: usize, message: String },
    #[error("lock contention on {0}")]
    LockContention(PathBuf),
    #[error("lock poisoned for {0}")]
    LockPoisoned(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] warden_core::CoreError),
    #[error("config error: {0}")]
    Config(String),
}
