use std::sync::Arc;

use serde_json::json;
use warden_core::content_fingerprint;
use warden_core::types::{ToolCall, ToolResult, WRITE_TO_FILE};
use warden_core::{IntentId, SessionId};
use warden_policy::{
    Decision, DenialReason, GovernanceEngine, GovernanceError, GovernanceWarning, PostOutcome,
    SessionRegistry, SkipReason,
};
use warden_store::{GovernanceConfig, ProjectStore};

const INTENTS: &str = r#"
active_intents:
  - id: "INT-001"
    name: "Hook middleware"
    status: "IN_PROGRESS"
    owned_scope:
      - "src/hooks/"
      - "docs/README.md"
    constraints:
      - "Do not change the public tool API"
    acceptance_criteria:
      - "Every write is gated"
  - id: "INT-002"
    name: "Packaging"
    status: "PENDING"
    owned_scope:
      - "package.json"
"#;

fn make_project(config: GovernanceConfig) -> (tempfile::TempDir, ProjectStore, GovernanceEngine) {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProjectStore::init(tmp.path()).unwrap();
    std::fs::write(store.layout().intents_file(), INTENTS).unwrap();
    let engine = GovernanceEngine::new(&store, config, Arc::new(SessionRegistry::new()));
    (tmp, store, engine)
}

fn write(path: &str, content: &str) -> ToolCall {
    ToolCall::parse(WRITE_TO_FILE, json!({ "path": path, "content": content })).unwrap()
}

/// Run one tool call through both hooks the way a tool implementation would.
fn run_tool(engine: &GovernanceEngine, session: &SessionId, call: &ToolCall) -> (Decision, PostOutcome) {
    let decision = engine.pre_action(session, call);
    let result = if decision.is_allowed() {
        ToolResult::ok(format!("{} done", call.name()))
    } else {
        ToolResult::failed("blocked")
    };
    let outcome = engine.post_action(session, call, &decision, &result);
    (decision, outcome)
}

// === Test 1: Scenario A, exact and directory scope ===
#[test]
fn test_scope_matching_scenario() {
    let (_tmp, _store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-a");
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();

    assert!(engine.pre_action(&s, &write("src/hooks/test.ts", "x")).is_allowed());
    assert!(engine.pre_action(&s, &write("docs/README.md", "x")).is_allowed());
    match engine.pre_action(&s, &write("package.json", "{}")) {
        Decision::Denied(reason @ DenialReason::ScopeViolation { .. }) => {
            let msg = reason.to_string();
            assert!(msg.contains("package.json"));
            assert!(msg.contains("src/hooks/"));
            assert!(msg.contains("docs/README.md"));
        }
        other => panic!("expected scope violation, got {other:?}"),
    }
}

// === Test 2: Scenario B, unbound non-strict degrades with a warning ===
#[test]
fn test_unbound_non_strict_allows_without_trace() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-b");

    for path in ["src/hooks/a.ts", "package.json", "anything/else.txt"] {
        let (decision, outcome) = run_tool(&engine, &s, &write(path, "x"));
        assert!(decision.is_allowed());
        assert!(matches!(
            decision.warnings(),
            [GovernanceWarning::Unbound { .. }]
        ));
        assert!(matches!(outcome, PostOutcome::Skipped(SkipReason::Unbound)));
    }
    assert!(store.read_trace().unwrap().is_empty());
}

// === Test 3: Scenario C, one record per authorized write ===
#[test]
fn test_write_produces_trace_record() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-c");

    // A prior record to compare timestamps against.
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    let (_, first) = run_tool(&engine, &s, &write("docs/README.md", "# Hooks"));
    let PostOutcome::Traced(first) = first else {
        panic!("expected first record");
    };

    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    let (decision, outcome) = run_tool(&engine, &s, &write("src/hooks/test.ts", "const x = 1;"));
    assert!(decision.is_allowed());
    let PostOutcome::Traced(record) = outcome else {
        panic!("expected a trace record, got {outcome:?}");
    };
    assert_eq!(record.intent_id, Some(IntentId::from("INT-001")));
    assert_eq!(record.tool, "write_to_file");
    assert_eq!(record.target, "src/hooks/test.ts");
    assert_eq!(record.content_fingerprint, content_fingerprint(b"const x = 1;"));
    assert!(record.timestamp_ms > first.timestamp_ms);
    assert_eq!(record.prev_hash, Some(first.record_hash));

    let on_disk = store.read_trace().unwrap();
    assert_eq!(on_disk, vec![first, record]);
}

// === Test 4: Strict mode denies unbound writes ===
#[test]
fn test_strict_mode_denies_unbound() {
    let (_tmp, store, engine) = make_project(GovernanceConfig {
        strict_mode: true,
        ..GovernanceConfig::default()
    });
    let s = SessionId::from("task-strict");
    let (decision, outcome) = run_tool(&engine, &s, &write("src/hooks/a.ts", "x"));
    assert!(matches!(
        decision,
        Decision::Denied(DenialReason::NoActiveIntent { .. })
    ));
    assert!(matches!(
        outcome,
        PostOutcome::Skipped(SkipReason::NotAuthorized)
    ));

    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    let (decision, _) = run_tool(&engine, &s, &write("src/hooks/a.ts", "x"));
    assert!(decision.is_allowed());
    assert_eq!(store.read_trace().unwrap().len(), 1);
}

// === Test 5: Audit completeness over a mixed sequence ===
#[test]
fn test_trace_count_matches_authorized_actions() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-mixed");
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();

    let calls = vec![
        write("src/hooks/a.ts", "a"),
        write("package.json", "{}"),
        ToolCall::parse("read_file", json!({ "path": "package.json" })).unwrap(),
        ToolCall::parse(
            "apply_diff",
            json!({ "path": "src/hooks/a.ts", "diff": "@@ -1 +1 @@\n-a\n+b\n" }),
        )
        .unwrap(),
        write("../escape.txt", "x"),
        ToolCall::parse(
            "insert_content",
            json!({ "path": "docs/README.md", "line": 1, "content": "intro" }),
        )
        .unwrap(),
        write("src/hooks-evil/x.ts", "x"),
    ];

    let mut authorized_mutations = 0;
    let mut previous_len = 0;
    for call in &calls {
        let (decision, outcome) = run_tool(&engine, &s, call);
        let mutating = engine.is_mutating(call);
        if decision.is_allowed() && mutating {
            authorized_mutations += 1;
            assert!(matches!(outcome, PostOutcome::Traced(_)));
        } else {
            assert!(matches!(outcome, PostOutcome::Skipped(_)));
        }
        let len = store.read_trace().unwrap().len();
        assert!(len >= previous_len);
        previous_len = len;
    }
    assert_eq!(authorized_mutations, 3);
    assert_eq!(store.read_trace().unwrap().len(), 3);
}

// === Test 6: Existing records never change ===
#[test]
fn test_trace_is_append_only() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-append");
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();

    let trace_path = store.layout().trace_file();
    let mut snapshot = String::new();
    for i in 0..5 {
        run_tool(&engine, &s, &write(&format!("src/hooks/f{i}.ts"), "x"));
        run_tool(&engine, &s, &write("package.json", "{}"));
        let content = std::fs::read_to_string(&trace_path).unwrap();
        assert!(content.starts_with(&snapshot));
        assert_eq!(content.lines().count(), i + 1);
        snapshot = content;
    }
    let report = store.verify_trace().unwrap();
    assert_eq!(report.records, 5);
    assert!(report.is_clean());
}

// === Test 7: Re-selection swaps scope; repeat selection is idempotent ===
#[test]
fn test_reselect_changes_scope() {
    let (_tmp, _store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-switch");

    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    assert_eq!(engine.registry().len(), 1);
    assert!(engine.pre_action(&s, &write("src/hooks/a.ts", "x")).is_allowed());
    assert!(!engine.pre_action(&s, &write("package.json", "x")).is_allowed());

    engine.select_intent(&s, &IntentId::from("INT-002")).unwrap();
    assert!(!engine.pre_action(&s, &write("src/hooks/a.ts", "x")).is_allowed());
    assert!(engine.pre_action(&s, &write("package.json", "x")).is_allowed());
}

// === Test 8: Store edits between selection and use are honored ===
#[test]
fn test_store_reload_is_honored() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-reload");
    engine.select_intent(&s, &IntentId::from("INT-002")).unwrap();
    assert!(!engine.pre_action(&s, &write("README.md", "x")).is_allowed());

    let widened = INTENTS.replace("      - \"package.json\"", "      - \"package.json\"\n      - \"README.md\"");
    std::fs::write(store.layout().intents_file(), widened).unwrap();
    assert!(engine.pre_action(&s, &write("README.md", "x")).is_allowed());
}

// === Test 9: Duplicate ids fail closed ===
#[test]
fn test_duplicate_intent_ids_are_errors() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-dup");
    engine.select_intent(&s, &IntentId::from("INT-002")).unwrap();

    let duplicated = format!(
        "{INTENTS}  - id: \"INT-002\"\n    name: \"Shadow\"\n    status: \"PENDING\"\n    owned_scope: [\".\"]\n"
    );
    std::fs::write(store.layout().intents_file(), duplicated).unwrap();

    match engine.pre_action(&s, &write("package.json", "x")) {
        Decision::Error(GovernanceError::DuplicateIntentId(id)) => {
            assert_eq!(id, IntentId::from("INT-002"))
        }
        other => panic!("expected duplicate id error, got {other:?}"),
    }
    assert!(matches!(
        engine.select_intent(&SessionId::from("other"), &IntentId::from("INT-002")),
        Err(GovernanceError::DuplicateIntentId(_))
    ));
}

// === Test 10: Parallel sessions share one engine and one log ===
#[test]
fn test_concurrent_sessions_share_trace() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());

    std::thread::scope(|scope| {
        for t in 0..6 {
            let engine = &engine;
            scope.spawn(move || {
                let s = SessionId::new(format!("task-{t}"));
                let intent = if t % 2 == 0 { "INT-001" } else { "INT-002" };
                engine.select_intent(&s, &IntentId::from(intent)).unwrap();
                for i in 0..10 {
                    let path = if t % 2 == 0 {
                        format!("src/hooks/t{t}_{i}.ts")
                    } else {
                        "package.json".to_string()
                    };
                    let (decision, outcome) = run_tool(engine, &s, &write(&path, "x"));
                    assert!(decision.is_allowed());
                    assert!(matches!(outcome, PostOutcome::Traced(_)));
                    // Cross-scope writes are denied for every session.
                    let (decision, _) = run_tool(engine, &s, &write("docs/other.md", "x"));
                    assert!(!decision.is_allowed());
                }
            });
        }
    });

    let records = store.read_trace().unwrap();
    assert_eq!(records.len(), 60);
    for r in &records {
        let expected = if r.target == "package.json" { "INT-002" } else { "INT-001" };
        assert_eq!(r.intent_id, Some(IntentId::from(expected)));
    }
    let report = store.verify_trace().unwrap();
    assert!(report.is_clean(), "{:?}", report.problems);
}

// === Test 11: Tampering with the log is detectable ===
#[test]
fn test_tampered_trace_fails_verification() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-tamper");
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    run_tool(&engine, &s, &write("src/hooks/a.ts", "a"));
    run_tool(&engine, &s, &write("src/hooks/b.ts", "b"));

    let path = store.layout().trace_file();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replacen("src/hooks/a.ts", "src/hooks/z.ts", 1)).unwrap();
    assert!(!store.verify_trace().unwrap().is_clean());
}

// === Test 12: Selection between pre and post cannot re-attribute a write ===
#[test]
fn test_select_between_pre_and_post() {
    let (_tmp, store, engine) = make_project(GovernanceConfig::default());
    let s = SessionId::from("task-interleave");

    let unbound_write = write("package.json", "{}");
    let decision = engine.pre_action(&s, &unbound_write);
    engine.select_intent(&s, &IntentId::from("INT-001")).unwrap();
    let outcome = engine.post_action(&s, &unbound_write, &decision, &ToolResult::ok("done"));
    assert!(matches!(outcome, PostOutcome::Skipped(SkipReason::Unbound)));

    let bound_write = write("src/hooks/a.ts", "x");
    let decision = engine.pre_action(&s, &bound_write);
    engine.select_intent(&s, &IntentId::from("INT-002")).unwrap();
    engine.post_action(&s, &bound_write, &decision, &ToolResult::ok("done"));

    let records = store.read_trace().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].intent_id, Some(IntentId::from("INT-001")));
    assert_eq!(records[0].target, "src/hooks/a.ts");
}
