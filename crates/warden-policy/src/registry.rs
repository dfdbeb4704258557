use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use warden_core::{IntentId, SessionId};

/// Which intent each live session is working under.
///
/// Constructed once by the host and shared by `Arc`. Every operation is a
/// single map access under the lock, so a binding is either fully replaced
/// or untouched.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    bindings: RwLock<HashMap<SessionId, IntentId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `session` to `intent`, returning the binding it replaced.
    /// Existence of the intent is checked by the caller at point of use.
    pub fn select(&self, session: &SessionId, intent: IntentId) -> Option<IntentId> {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.clone(), intent)
    }

    pub fn active(&self, session: &SessionId) -> Option<IntentId> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
            .cloned()
    }

    /// Drop the binding when a session ends.
    pub fn clear(&self, session: &SessionId) -> Option<IntentId> {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session)
    }

    pub fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
