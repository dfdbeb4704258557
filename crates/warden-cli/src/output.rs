use serde_json::{json, Value};

use warden_policy::{Decision, PostOutcome};

/// Format a key-value pair for display.
pub fn kv(key: &str, value: &str) -> String {
    format!("{key:>16}: {value}")
}

/// Format a header line.
pub fn header(title: &str) -> String {
    format!("=== {title} ===")
}

pub fn decision_json(decision: &Decision) -> Value {
    match decision {
        Decision::Allowed(allowance) => json!({
            "status": "allowed",
            "allowance": allowance,
            "messages": allowance.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        }),
        Decision::Denied(reason) => json!({
            "status": "denied",
            "code": reason.code(),
            "message": reason.to_string(),
            "detail": reason,
        }),
        Decision::Error(err) => json!({
            "status": "error",
            "kind": err.kind(),
            "message": err.to_string(),
        }),
    }
}

pub fn outcome_json(outcome: &PostOutcome) -> Value {
    match outcome {
        PostOutcome::Traced(record) => json!({ "status": "traced", "record": record }),
        PostOutcome::Skipped(reason) => json!({ "status": "skipped", "reason": reason }),
        PostOutcome::TraceFailed(failure) => json!({
            "status": "trace_failed",
            "message": failure.to_string(),
        }),
        PostOutcome::Selected(ctx) => json!({
            "status": "selected",
            "intent_id": ctx.intent.id,
            "context": ctx.render(),
        }),
        PostOutcome::SelectFailed(err) => json!({
            "status": "select_failed",
            "kind": err.kind(),
            "message": err.to_string(),
        }),
    }
}
