use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use ulid::Ulid;

use warden_core::types::{ToolCall, ToolResult};
use warden_core::{IntentId, SessionId};
use warden_policy::{Decision, GovernanceEngine};

use super::{open_engine, open_store};
use crate::output::{decision_json, outcome_json};

#[derive(Args)]
pub struct HookArgs {
    /// Deny mutations when no intent is selected
    #[arg(long)]
    strict: bool,
    /// Context field attached to every trace record (key=value, repeatable)
    #[arg(long = "meta")]
    meta: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum HookRequest {
    Select {
        session: SessionId,
        intent_id: IntentId,
    },
    Pre {
        session: SessionId,
        tool: String,
        #[serde(default)]
        params: Value,
    },
    Post {
        session: SessionId,
        call_id: String,
        result: ToolResult,
    },
    End {
        session: SessionId,
    },
}

struct PendingCall {
    session: SessionId,
    call: ToolCall,
    decision: Decision,
}

/// One host connection. Pre-action decisions are held by call id until the
/// matching post request arrives.
pub struct HookServer<'e> {
    engine: &'e GovernanceEngine,
    pending: HashMap<String, PendingCall>,
}

impl<'e> HookServer<'e> {
    pub fn new(engine: &'e GovernanceEngine) -> Self {
        Self {
            engine,
            pending: HashMap::new(),
        }
    }

    fn needs_post(&self, call: &ToolCall, decision: &Decision) -> bool {
        decision.is_allowed()
            && (self.engine.is_mutating(call) || matches!(call, ToolCall::SelectActiveIntent(_)))
    }

    pub fn handle_line(&mut self, line: &str) -> Value {
        let request: HookRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => return failure(format!("malformed request: {e}")),
        };
        match request {
            HookRequest::Select { session, intent_id } => {
                match self.engine.select_intent(&session, &intent_id) {
                    Ok(ctx) => json!({ "ok": true, "context": ctx.render() }),
                    Err(e) => json!({ "ok": false, "kind": e.kind(), "error": e.to_string() }),
                }
            }
            HookRequest::Pre {
                session,
                tool,
                params,
            } => {
                let params = if params.is_null() { json!({}) } else { params };
                let call = match ToolCall::parse(&tool, params) {
                    Ok(c) => c,
                    Err(e) => return failure(e.to_string()),
                };
                let decision = self.engine.pre_action(&session, &call);
                let response_decision = decision_json(&decision);
                // Only calls whose post has an effect are held; the rest get
                // a null call_id and need no post.
                let call_id = if self.needs_post(&call, &decision) {
                    let call_id = Ulid::new().to_string();
                    self.pending.insert(
                        call_id.clone(),
                        PendingCall {
                            session,
                            call,
                            decision,
                        },
                    );
                    Some(call_id)
                } else {
                    None
                };
                json!({
                    "ok": true,
                    "call_id": call_id,
                    "decision": response_decision,
                })
            }
            HookRequest::Post {
                session,
                call_id,
                result,
            } => {
                let Some(pending) = self.pending.remove(&call_id) else {
                    return failure(format!("unknown call_id: {call_id}"));
                };
                if pending.session != session {
                    return failure(format!(
                        "call_id {call_id} belongs to session {}, not {session}",
                        pending.session
                    ));
                }
                let outcome =
                    self.engine
                        .post_action(&session, &pending.call, &pending.decision, &result);
                json!({ "ok": true, "outcome": outcome_json(&outcome) })
            }
            HookRequest::End { session } => {
                self.engine.end_session(&session);
                self.pending.retain(|_, p| p.session != session);
                json!({ "ok": true })
            }
        }
    }
}

fn failure(message: String) -> Value {
    json!({ "ok": false, "error": message })
}

pub fn run(args: HookArgs, root: Option<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let engine = open_engine(&store, args.strict, &args.meta)?;
    tracing::info!(
        root = %store.root().display(),
        strict = engine.config().strict_mode,
        "hook server ready"
    );

    let mut server = HookServer::new(&engine);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = server.handle_line(&line);
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}
