pub mod error;
pub mod hash;
pub mod id;
pub mod types;

pub use error::CoreError;
pub use hash::{content_fingerprint, record_hash};
pub use id::{IntentId, RecordHash, SessionId};
