use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use crate::path::{normalize, within};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    Allow { target: String, matched: String },
    Deny(ScopeDenial),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDenial {
    /// Normalized target is outside every owned entry.
    NotInScope { target: String },
    /// Target resolves above the project root; carries the raw input.
    OutOfRoot { target: String },
}

impl ScopeDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, ScopeDecision::Allow { .. })
    }
}

/// An entry always matches literally. Entries containing glob
/// metacharacters additionally match as a pattern.
#[derive(Debug, Clone)]
struct CompiledEntry {
    raw: String,
    prefix: Option<String>,
    glob: Option<GlobMatcher>,
}

impl CompiledEntry {
    fn matches(&self, normalized: &str) -> bool {
        self.prefix.as_deref().is_some_and(|p| within(normalized, p))
            || self.glob.as_ref().is_some_and(|g| g.is_match(normalized))
    }
}

/// An intent's owned scope, compiled against a project root.
#[derive(Debug, Clone)]
pub struct Scope<'r> {
    root: &'r Path,
    entries: Vec<CompiledEntry>,
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '[', '{'])
}

impl<'r> Scope<'r> {
    pub fn compile(root: &'r Path, owned_scope: &[String]) -> Self {
        let entries = owned_scope
            .iter()
            .filter_map(|raw| compile_entry(root, raw))
            .collect();
        Self { root, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn authorize(&self, target: &str) -> ScopeDecision {
        let normalized = match normalize(self.root, target) {
            Ok(n) => n,
            Err(_) => {
                return ScopeDecision::Deny(ScopeDenial::OutOfRoot {
                    target: target.to_string(),
                })
            }
        };
        let hit = self.entries.iter().find(|e| e.matches(&normalized));
        match hit {
            Some(e) => ScopeDecision::Allow {
                target: normalized,
                matched: e.raw.clone(),
            },
            None => ScopeDecision::Deny(ScopeDenial::NotInScope { target: normalized }),
        }
    }
}

fn compile_entry(root: &Path, raw: &str) -> Option<CompiledEntry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let prefix = match normalize(root, trimmed) {
        Ok(prefix) => Some(prefix),
        Err(_) => {
            tracing::warn!(entry = %raw, "owned_scope entry escapes the project root, ignoring");
            return None;
        }
    };
    let glob = if is_glob(trimmed) {
        let pattern = trimmed.replace('\\', "/");
        let pattern = pattern.trim_start_matches("./");
        match GlobBuilder::new(pattern).literal_separator(true).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                tracing::warn!(entry = %raw, error = %e, "invalid glob in owned_scope, matching literally");
                None
            }
        }
    } else {
        None
    };
    Some(CompiledEntry {
        raw: raw.to_string(),
        prefix,
        glob,
    })
}

/// Decide whether `target` may be mutated under `owned_scope`.
pub fn authorize(root: &Path, target: &str, owned_scope: &[String]) -> ScopeDecision {
    Scope::compile(root, owned_scope).authorize(target)
}
