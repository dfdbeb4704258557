use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use warden_core::types::Intent;
use warden_core::IntentId;

use crate::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct IntentDocument {
    #[serde(default)]
    active_intents: Option<Vec<Intent>>,
}

/// Reads the durable intent list. Never writes it.
#[derive(Debug, Clone)]
pub struct IntentStore {
    path: PathBuf,
}

impl IntentStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or empty store is an empty set. Malformed content is
    /// `IntentStoreCorrupt`, never an empty set.
    pub fn load(&self) -> Result<IntentSet, StoreError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no intent store, treating as empty");
            return Ok(IntentSet::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        parse_intents(&content, &self.path)
    }
}

pub fn parse_intents(content: &str, origin: &Path) -> Result<IntentSet, StoreError> {
    if content.trim().is_empty() {
        return Ok(IntentSet::default());
    }
    let doc: IntentDocument =
        serde_yaml::from_str(content).map_err(|e| StoreError::IntentStoreCorrupt {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
    let set = IntentSet {
        intents: doc.active_intents.unwrap_or_default(),
    };
    for issue in set.integrity_issues() {
        tracing::warn!(path = %origin.display(), "{issue}");
    }
    Ok(set)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    DuplicateId(IntentId),
    EmptyScope(IntentId),
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateId(id) => write!(f, "intent id {id} is declared more than once"),
            IntegrityIssue::EmptyScope(id) => {
                write!(f, "intent {id} has an empty owned_scope and cannot authorize writes")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSet {
    intents: Vec<Intent>,
}

impl IntentSet {
    pub fn from_intents(intents: Vec<Intent>) -> Self {
        Self { intents }
    }

    /// Linear search. A duplicated id is a configuration error rather than
    /// first-match-wins.
    pub fn get(&self, id: &IntentId) -> Result<Option<&Intent>, StoreError> {
        let mut matches = self.intents.iter().filter(|i| &i.id == id);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(StoreError::DuplicateIntentId(id.clone()));
        }
        Ok(first)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for (idx, intent) in self.intents.iter().enumerate() {
            let seen_before = self.intents[..idx].iter().any(|i| i.id == intent.id);
            let seen_after = self.intents[idx + 1..].iter().any(|i| i.id == intent.id);
            if seen_after && !seen_before {
                issues.push(IntegrityIssue::DuplicateId(intent.id.clone()));
            }
            if intent.authorizes_nothing() {
                issues.push(IntegrityIssue::EmptyScope(intent.id.clone()));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::types::IntentStatus;

    const SAMPLE: &str = r#"
active_intents:
  - id: "INT-001"
    name: "Hook middleware"
    status: "IN_PROGRESS"
    owned_scope:
      - "src/hooks/"
      - "docs/README.md"
    constraints:
      - "Must not touch the public API"
    acceptance_criteria:
      - "Unit tests pass"
  - id: "INT-002"
    name: "Docs pass"
    status: pending
    owned_scope: []
"#;

    fn store_with(content: &str) -> (tempfile::TempDir, IntentStore) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("active_intents.yaml");
        std::fs::write(&path, content).unwrap();
        let store = IntentStore::new(&path);
        (tmp, store)
    }

    #[test]
    fn loads_intents_in_order() {
        let (_tmp, store) = store_with(SAMPLE);
        let set = store.load().unwrap();
        assert_eq!(set.len(), 2);
        let first = set.get(&IntentId::from("INT-001")).unwrap().unwrap();
        assert_eq!(first.status, IntentStatus::InProgress);
        assert_eq!(first.owned_scope, vec!["src/hooks/", "docs/README.md"]);
        assert_eq!(first.constraints.len(), 1);
        let second = set.get(&IntentId::from("INT-002")).unwrap().unwrap();
        assert_eq!(second.status, IntentStatus::Pending);
        assert!(second.acceptance_criteria.is_empty());
    }

    #[test]
    fn missing_store_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IntentStore::new(&tmp.path().join("nope.yaml"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn empty_documents_are_empty() {
        for content in ["", "   \n", "active_intents:\n", "active_intents: []\n"] {
            let (_tmp, store) = store_with(content);
            assert!(store.load().unwrap().is_empty(), "content: {content:?}");
        }
    }

    #[test]
    fn malformed_store_is_corrupt_not_empty() {
        let (_tmp, store) = store_with("active_intents:\n  - id: [unclosed\n");
        assert!(matches!(
            store.load(),
            Err(StoreError::IntentStoreCorrupt { .. })
        ));

        let (_tmp, store) = store_with("active_intents:\n  - id: INT-9\n    status: BOGUS\n    name: x\n");
        assert!(matches!(
            store.load(),
            Err(StoreError::IntentStoreCorrupt { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let doc = r#"
active_intents:
  - { id: "INT-001", name: "a", status: PENDING, owned_scope: ["a/"] }
  - { id: "INT-001", name: "b", status: PENDING, owned_scope: ["b/"] }
  - { id: "INT-002", name: "c", status: COMPLETED, owned_scope: ["c/"] }
"#;
        let (_tmp, store) = store_with(doc);
        let set = store.load().unwrap();
        assert!(matches!(
            set.get(&IntentId::from("INT-001")),
            Err(StoreError::DuplicateIntentId(_))
        ));
        assert!(set.get(&IntentId::from("INT-002")).unwrap().is_some());
        assert!(set.get(&IntentId::from("INT-404")).unwrap().is_none());
        assert_eq!(
            set.integrity_issues(),
            vec![IntegrityIssue::DuplicateId(IntentId::from("INT-001"))]
        );
    }

    #[test]
    fn empty_scope_is_an_integrity_issue() {
        let (_tmp, store) = store_with(SAMPLE);
        let issues = store.load().unwrap().integrity_issues();
        assert_eq!(
            issues,
            vec![IntegrityIssue::EmptyScope(IntentId::from("INT-002"))]
        );
    }

    #[test]
    fn json_store_is_accepted() {
        let doc = r#"{"active_intents":[{"id":"INT-7","name":"j","status":"COMPLETED","owned_scope":["x"]}]}"#;
        let (_tmp, store) = store_with(doc);
        let set = store.load().unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn status_survives_roundtrip() {
        let (_tmp, store) = store_with(SAMPLE);
        let set = store.load().unwrap();
        let intents: Vec<Intent> = set.iter().cloned().collect();
        let yaml = serde_yaml::to_string(&IntentDocument {
            active_intents: Some(intents.clone()),
        })
        .unwrap();
        assert!(yaml.contains("IN_PROGRESS"));
        let reparsed = parse_intents(&yaml, Path::new("mem")).unwrap();
        assert_eq!(reparsed, IntentSet::from_intents(intents));
    }
}
