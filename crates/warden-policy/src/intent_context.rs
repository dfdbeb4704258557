use std::fmt::Write;

use warden_core::types::Intent;

const MAX_ITEMS: usize = 32;
const MAX_ITEM_CHARS: usize = 400;

/// What the agent gets back from `select_active_intent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentContext {
    pub intent: Intent,
}

impl IntentContext {
    pub fn new(intent: Intent) -> Self {
        Self { intent }
    }

    /// Bounded `<intent_context>` block for inclusion in the agent's prompt.
    /// Lists are capped at 32 items and items at 400 characters.
    pub fn render(&self) -> String {
        let i = &self.intent;
        let mut out = String::new();
        let _ = writeln!(out, "<intent_context>");
        let _ = writeln!(
            out,
            "  <intent id=\"{}\" name=\"{}\" status=\"{}\"/>",
            escape(i.id.as_str()),
            escape(&i.name),
            i.status.as_str()
        );
        section(&mut out, "owned_scope", "path", &i.owned_scope);
        section(&mut out, "constraints", "constraint", &i.constraints);
        section(
            &mut out,
            "acceptance_criteria",
            "criterion",
            &i.acceptance_criteria,
        );
        out.push_str("</intent_context>\n");
        out
    }
}

fn section(out: &mut String, name: &str, item: &str, values: &[String]) {
    if values.is_empty() {
        let _ = writeln!(out, "  <{name}/>");
        return;
    }
    let _ = writeln!(out, "  <{name}>");
    for v in values.iter().take(MAX_ITEMS) {
        let _ = writeln!(out, "    <{item}>{}</{item}>", escape(&clip(v, MAX_ITEM_CHARS)));
    }
    if values.len() > MAX_ITEMS {
        let _ = writeln!(out, "    <!-- {} more omitted -->", values.len() - MAX_ITEMS);
    }
    let _ = writeln!(out, "  </{name}>");
}

/// Cut to `limit` characters on a char boundary. Text is otherwise passed
/// through as written.
fn clip(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
