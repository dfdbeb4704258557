use warden_core::types::{ContextMetadata, ToolCall};
use warden_core::SessionId;

/// Supplies the contextual fields attached verbatim to each trace record,
/// such as the revision the working tree was at.
pub trait ContextProvider: Send + Sync {
    fn gather(&self, session: &SessionId, call: &ToolCall) -> ContextMetadata;
}

pub struct NoContext;

impl ContextProvider for NoContext {
    fn gather(&self, _session: &SessionId, _call: &ToolCall) -> ContextMetadata {
        ContextMetadata::new()
    }
}

/// Same fields on every record.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    fields: ContextMetadata,
}

impl StaticContext {
    pub fn new(fields: ContextMetadata) -> Self {
        Self { fields }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl ContextProvider for StaticContext {
    fn gather(&self, _session: &SessionId, _call: &ToolCall) -> ContextMetadata {
        self.fields.clone()
    }
}
