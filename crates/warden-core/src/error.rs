use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid record hash: {0}")]
    InvalidRecordHash(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("malformed parameters for {tool}: {message}")]
    MalformedParams { tool: String, message: String },
}
