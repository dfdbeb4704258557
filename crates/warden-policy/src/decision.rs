use std::fmt;

use serde::Serialize;
use thiserror::Error;

use warden_core::types::TraceRecord;
use warden_core::IntentId;
use warden_store::StoreError;

use crate::intent_context::IntentContext;
use crate::GovernanceError;

/// Non-fatal signals attached to an allowed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum GovernanceWarning {
    /// Mutation allowed without an active intent; it will not be traced.
    Unbound { tool: String },
    /// The file changed since the agent last read it.
    StaleContent {
        target: String,
        expected: String,
        actual: Option<String>,
    },
}

impl fmt::Display for GovernanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernanceWarning::Unbound { tool } => write!(
                f,
                "{tool} allowed without an active intent; governance is degraded and this action will not be traced"
            ),
            GovernanceWarning::StaleContent {
                target,
                expected,
                actual,
            } => write!(
                f,
                "{target} changed since it was read (expected {expected}, found {})",
                actual.as_deref().unwrap_or("no file")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum DenialReason {
    NoActiveIntent {
        tool: String,
    },
    IntentNotFound {
        intent_id: IntentId,
    },
    ScopeViolation {
        intent_id: IntentId,
        target: String,
        owned_scope: Vec<String>,
    },
    PathEscapesRoot {
        intent_id: Option<IntentId>,
        target: String,
        owned_scope: Vec<String>,
    },
    UntargetedMutation {
        intent_id: IntentId,
        tool: String,
    },
    /// Target lies inside the governance directory itself.
    ProtectedPath {
        intent_id: Option<IntentId>,
        target: String,
    },
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::NoActiveIntent { .. } => "NoActiveIntent",
            DenialReason::IntentNotFound { .. } => "IntentNotFound",
            DenialReason::ScopeViolation { .. } => "ScopeViolation",
            DenialReason::PathEscapesRoot { .. } => "PathEscapesRoot",
            DenialReason::UntargetedMutation { .. } => "UntargetedMutation",
            DenialReason::ProtectedPath { .. } => "ProtectedPath",
        }
    }
}

fn scope_list(owned_scope: &[String]) -> String {
    if owned_scope.is_empty() {
        return "(empty)".to_string();
    }
    owned_scope.join(", ")
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::NoActiveIntent { tool } => write!(
                f,
                "{tool} requires an active intent; call select_active_intent first"
            ),
            DenialReason::IntentNotFound { intent_id } => write!(
                f,
                "active intent {intent_id} no longer exists in the intent store; select a valid intent"
            ),
            DenialReason::ScopeViolation {
                intent_id,
                target,
                owned_scope,
            } => write!(
                f,
                "scope violation: intent {intent_id} is not authorized to edit {target}; owned scope: [{}]",
                scope_list(owned_scope)
            ),
            DenialReason::PathEscapesRoot {
                intent_id,
                target,
                owned_scope,
            } => {
                write!(f, "{target} resolves outside the project root")?;
                if let Some(id) = intent_id {
                    write!(f, "; intent {id} owned scope: [{}]", scope_list(owned_scope))?;
                }
                Ok(())
            }
            DenialReason::UntargetedMutation { intent_id, tool } => write!(
                f,
                "{tool} is configured as mutating but has no recognizable target path; intent {intent_id} cannot authorize it"
            ),
            DenialReason::ProtectedPath { target, .. } => write!(
                f,
                "{target} is governance state and cannot be modified by agent tools under any intent"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Allowance {
    /// Intent the decision was made under, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<IntentId>,
    /// Normalized target for mutating tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<GovernanceWarning>,
}

/// Result of the pre-action hook. Denial is data, not an error.
#[derive(Debug)]
pub enum Decision {
    Allowed(Allowance),
    Denied(DenialReason),
    Error(GovernanceError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }

    pub fn warnings(&self) -> &[GovernanceWarning] {
        match self {
            Decision::Allowed(a) => &a.warnings,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotMutating,
    NotAuthorized,
    Unbound,
}

/// The mutation already happened; only its audit record is missing.
#[derive(Debug, Error)]
#[error("mutation was performed but its trace record could not be written: {0}")]
pub struct TraceAppendFailure(#[source] pub StoreError);

/// Result of the post-action hook.
#[derive(Debug)]
pub enum PostOutcome {
    Traced(TraceRecord),
    Skipped(SkipReason),
    TraceFailed(TraceAppendFailure),
    /// `select_active_intent` bound the session.
    Selected(IntentContext),
    /// `select_active_intent` named an intent that could not be bound; the
    /// previous binding is unchanged.
    SelectFailed(GovernanceError),
}
