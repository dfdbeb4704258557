use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::hash::record_hash;
use crate::id::{IntentId, RecordHash, SessionId};
use crate::CoreError;

pub type ContextMetadata = BTreeMap<String, serde_json::Value>;

/// Everything the post-action hook knows about an authorized mutation.
/// The trace writer turns a draft into a sealed [`TraceRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct TraceDraft {
    pub session_id: SessionId,
    pub intent_id: Option<IntentId>,
    pub tool: String,
    pub target: String,
    pub content_fingerprint: String,
    pub result_summary: String,
    pub succeeded: bool,
    pub context: ContextMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub id: Ulid,
    pub timestamp_ms: u64,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<IntentId>,
    pub tool: String,
    pub target: String,
    pub content_fingerprint: String,
    pub result_summary: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: ContextMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<RecordHash>,
    pub record_hash: RecordHash,
}

// Field order here defines the hashed byte layout.
#[derive(Serialize)]
struct TraceBody<'a> {
    id: &'a Ulid,
    timestamp_ms: u64,
    session_id: &'a SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    intent_id: Option<&'a IntentId>,
    tool: &'a str,
    target: &'a str,
    content_fingerprint: &'a str,
    result_summary: &'a str,
    succeeded: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    context: &'a ContextMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_hash: Option<&'a RecordHash>,
}

impl TraceRecord {
    pub fn seal(
        draft: TraceDraft,
        timestamp_ms: u64,
        prev_hash: Option<RecordHash>,
    ) -> Result<Self, CoreError> {
        let mut record = TraceRecord {
            id: Ulid::new(),
            timestamp_ms,
            session_id: draft.session_id,
            intent_id: draft.intent_id,
            tool: draft.tool,
            target: draft.target,
            content_fingerprint: draft.content_fingerprint,
            result_summary: draft.result_summary,
            succeeded: draft.succeeded,
            context: draft.context,
            prev_hash,
            record_hash: RecordHash::from_bytes([0; 32]),
        };
        record.record_hash = record.compute_hash()?;
        Ok(record)
    }

    pub fn compute_hash(&self) -> Result<RecordHash, CoreError> {
        let body = TraceBody {
            id: &self.id,
            timestamp_ms: self.timestamp_ms,
            session_id: &self.session_id,
            intent_id: self.intent_id.as_ref(),
            tool: &self.tool,
            target: &self.target,
            content_fingerprint: &self.content_fingerprint,
            result_summary: &self.result_summary,
            succeeded: self.succeeded,
            context: &self.context,
            prev_hash: self.prev_hash.as_ref(),
        };
        let bytes =
            serde_json::to_vec(&body).map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(record_hash(&bytes))
    }

    pub fn is_intact(&self) -> bool {
        matches!(self.compute_hash(), Ok(h) if h == self.record_hash)
    }

    /// One JSON object terminated by a newline, ready to append.
    pub fn to_line(&self) -> Result<String, CoreError> {
        let mut line =
            serde_json::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}

/// Truncate tool output to at most `limit` characters for the audit log.
pub fn summarize(output: &str, limit: usize) -> String {
    let flat = output.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = flat.chars().take(keep).collect();
    out.push_str("...");
    out
}
