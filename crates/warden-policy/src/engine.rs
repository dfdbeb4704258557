use std::path::{Path, PathBuf};
use std::sync::Arc;

use warden_core::types::{summarize, ToolCall, ToolResult, TraceDraft};
use warden_core::{content_fingerprint, IntentId, SessionId};
use warden_store::layout::ORCHESTRATION_DIR;
use warden_store::{GovernanceConfig, IntentStore, ProjectStore, TraceWriter};

use crate::context::{ContextProvider, NoContext};
use crate::decision::{
    Allowance, Decision, DenialReason, GovernanceWarning, PostOutcome, SkipReason,
    TraceAppendFailure,
};
use crate::intent_context::IntentContext;
use crate::path::{normalize, within};
use crate::registry::SessionRegistry;
use crate::scope::{Scope, ScopeDecision, ScopeDenial};
use crate::GovernanceError;

/// Gate and audit for every tool call an agent makes.
///
/// Tool implementations call [`pre_action`](Self::pre_action) before their
/// effect and [`post_action`](Self::post_action) after it. The intent store
/// is re-read on every decision so edits to it take effect immediately.
pub struct GovernanceEngine {
    root: PathBuf,
    config: GovernanceConfig,
    intents: IntentStore,
    trace: TraceWriter,
    registry: Arc<SessionRegistry>,
    context: Box<dyn ContextProvider>,
}

impl GovernanceEngine {
    pub fn new(
        store: &ProjectStore,
        config: GovernanceConfig,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            root: store.root().to_path_buf(),
            config,
            intents: store.intents(),
            trace: store.trace_writer(),
            registry,
            context: Box::new(NoContext),
        }
    }

    pub fn with_context(mut self, provider: impl ContextProvider + 'static) -> Self {
        self.context = Box::new(provider);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn is_mutating(&self, call: &ToolCall) -> bool {
        self.config.is_mutating(call.name())
    }

    /// Validate `intent_id` against the store and bind it to `session`.
    /// On any failure the previous binding is left as it was.
    pub fn select_intent(
        &self,
        session: &SessionId,
        intent_id: &IntentId,
    ) -> Result<IntentContext, GovernanceError> {
        let set = self.intents.load()?;
        let intent = set
            .get(intent_id)?
            .cloned()
            .ok_or_else(|| GovernanceError::IntentNotFound(intent_id.clone()))?;
        if intent.authorizes_nothing() {
            tracing::warn!(intent = %intent.id, "selected intent has an empty owned_scope");
        }
        let previous = self.registry.select(session, intent.id.clone());
        tracing::info!(
            session = %session,
            intent = %intent.id,
            previous = ?previous,
            "active intent selected"
        );
        Ok(IntentContext::new(intent))
    }

    pub fn end_session(&self, session: &SessionId) {
        if let Some(intent) = self.registry.clear(session) {
            tracing::debug!(session = %session, intent = %intent, "session ended");
        }
    }

    /// Decide whether `call` may run. Never touches the filesystem beyond
    /// reading the intent store and, for stale-write checks, the target.
    pub fn pre_action(&self, session: &SessionId, call: &ToolCall) -> Decision {
        if !self.is_mutating(call) {
            return Decision::Allowed(Allowance::default());
        }
        let decision = match self.registry.active(session) {
            None => self.pre_action_unbound(call),
            Some(intent_id) => self.pre_action_bound(call, intent_id),
        };
        match &decision {
            Decision::Allowed(a) => {
                tracing::debug!(session = %session, tool = call.name(), target = ?a.target, "allowed");
                for w in &a.warnings {
                    tracing::warn!(session = %session, "{w}");
                }
            }
            Decision::Denied(reason) => {
                tracing::info!(session = %session, tool = call.name(), code = reason.code(), "{reason}");
            }
            Decision::Error(err) => {
                tracing::error!(session = %session, tool = call.name(), kind = err.kind(), "{err}");
            }
        }
        decision
    }

    fn pre_action_unbound(&self, call: &ToolCall) -> Decision {
        if self.config.strict_mode {
            return Decision::Denied(DenialReason::NoActiveIntent {
                tool: call.name().to_string(),
            });
        }
        let target = match call.target() {
            Some(raw) => match normalize(&self.root, raw) {
                Ok(t) if is_protected(&t) => {
                    return Decision::Denied(DenialReason::ProtectedPath {
                        intent_id: None,
                        target: t,
                    })
                }
                Ok(t) => Some(t),
                Err(_) => {
                    return Decision::Denied(DenialReason::PathEscapesRoot {
                        intent_id: None,
                        target: raw.to_string(),
                        owned_scope: Vec::new(),
                    })
                }
            },
            None => None,
        };
        let mut warnings = vec![GovernanceWarning::Unbound {
            tool: call.name().to_string(),
        }];
        if let Some(t) = &target {
            warnings.extend(self.staleness(call, t));
        }
        Decision::Allowed(Allowance {
            intent_id: None,
            target,
            warnings,
        })
    }

    fn pre_action_bound(&self, call: &ToolCall, intent_id: IntentId) -> Decision {
        let set = match self.intents.load() {
            Ok(set) => set,
            Err(e) => return Decision::Error(e.into()),
        };
        let intent = match set.get(&intent_id) {
            Ok(Some(intent)) => intent,
            Ok(None) => return Decision::Denied(DenialReason::IntentNotFound { intent_id }),
            Err(e) => return Decision::Error(e.into()),
        };
        let Some(raw_target) = call.target() else {
            return Decision::Denied(DenialReason::UntargetedMutation {
                intent_id,
                tool: call.name().to_string(),
            });
        };
        match Scope::compile(&self.root, &intent.owned_scope).authorize(raw_target) {
            ScopeDecision::Allow { target, .. } if is_protected(&target) => {
                Decision::Denied(DenialReason::ProtectedPath {
                    intent_id: Some(intent_id),
                    target,
                })
            }
            ScopeDecision::Allow { target, .. } => {
                let warnings = self.staleness(call, &target).into_iter().collect();
                Decision::Allowed(Allowance {
                    intent_id: Some(intent_id),
                    target: Some(target),
                    warnings,
                })
            }
            ScopeDecision::Deny(ScopeDenial::NotInScope { target }) => {
                Decision::Denied(DenialReason::ScopeViolation {
                    intent_id,
                    target,
                    owned_scope: intent.owned_scope.clone(),
                })
            }
            ScopeDecision::Deny(ScopeDenial::OutOfRoot { target }) => {
                Decision::Denied(DenialReason::PathEscapesRoot {
                    intent_id: Some(intent_id),
                    target,
                    owned_scope: intent.owned_scope.clone(),
                })
            }
        }
    }

    // Advisory only: a mismatch never turns into a denial.
    fn staleness(&self, call: &ToolCall, target: &str) -> Option<GovernanceWarning> {
        let expected = call.expected_fingerprint()?;
        let actual = std::fs::read(self.root.join(target))
            .ok()
            .map(|bytes| content_fingerprint(&bytes));
        if actual.as_deref() == Some(expected) {
            return None;
        }
        Some(GovernanceWarning::StaleContent {
            target: target.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }

    /// Record an authorized mutation, or apply a `select_active_intent`
    /// call. Trace failures are reported in the outcome and never undo the
    /// mutation.
    ///
    /// The record is attributed to the intent the pre-action decision was
    /// made under, not whatever the session is bound to by now.
    pub fn post_action(
        &self,
        session: &SessionId,
        call: &ToolCall,
        decision: &Decision,
        result: &ToolResult,
    ) -> PostOutcome {
        if let ToolCall::SelectActiveIntent(params) = call {
            if !decision.is_allowed() {
                return PostOutcome::Skipped(SkipReason::NotAuthorized);
            }
            return match self.select_intent(session, &params.intent_id) {
                Ok(ctx) => PostOutcome::Selected(ctx),
                Err(e) => PostOutcome::SelectFailed(e),
            };
        }
        if !self.is_mutating(call) {
            return PostOutcome::Skipped(SkipReason::NotMutating);
        }
        let Decision::Allowed(allowance) = decision else {
            return PostOutcome::Skipped(SkipReason::NotAuthorized);
        };
        let Some(intent_id) = allowance.intent_id.clone() else {
            tracing::warn!(
                session = %session,
                tool = call.name(),
                "mutation performed without an active intent; no trace record written"
            );
            return PostOutcome::Skipped(SkipReason::Unbound);
        };

        let target = allowance
            .target
            .clone()
            .or_else(|| call.target().map(str::to_string))
            .unwrap_or_default();
        let draft = TraceDraft {
            session_id: session.clone(),
            intent_id: Some(intent_id),
            tool: call.name().to_string(),
            target,
            content_fingerprint: content_fingerprint(call.payload()),
            result_summary: summarize(&result.output, self.config.summary_limit),
            succeeded: result.success,
            context: self.context.gather(session, call),
        };
        match self.trace.append(draft) {
            Ok(record) => PostOutcome::Traced(record),
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "trace append failed");
                PostOutcome::TraceFailed(TraceAppendFailure(e))
            }
        }
    }
}

/// `.orchestration/` holds the intent store and the trace log. Compared
/// case-insensitively.
fn is_protected(target: &str) -> bool {
    within(&target.to_ascii_lowercase(), ORCHESTRATION_DIR)
}
