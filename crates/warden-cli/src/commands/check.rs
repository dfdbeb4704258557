use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use warden_core::types::{ToolCall, WRITE_TO_FILE};
use warden_core::{IntentId, SessionId};
use warden_policy::Decision;

use super::{open_engine, open_store};

#[derive(Args)]
pub struct CheckArgs {
    /// Path the tool would act on
    path: String,
    /// Intent to select before checking
    #[arg(short, long)]
    intent: Option<String>,
    /// Tool name
    #[arg(short, long, default_value = WRITE_TO_FILE)]
    tool: String,
    /// Deny mutations when no intent is selected
    #[arg(long)]
    strict: bool,
}

pub fn run(args: CheckArgs, root: Option<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let engine = open_engine(&store, args.strict, &[])?;
    let session = SessionId::from("cli");

    if let Some(id) = &args.intent {
        engine.select_intent(&session, &IntentId::new(id.as_str()))?;
    }

    // Empty payload fields satisfy every recognized parameter shape.
    let params = json!({
        "path": args.path,
        "content": "",
        "diff": "",
        "line": 0,
        "search": "",
        "replace": "",
    });
    let call = ToolCall::parse(&args.tool, params)?;

    match engine.pre_action(&session, &call) {
        Decision::Allowed(allowance) => {
            match &allowance.target {
                Some(target) => println!("ALLOW {} {target}", call.name()),
                None => println!("ALLOW {}", call.name()),
            }
            for warning in &allowance.warnings {
                println!("  warning: {warning}");
            }
            Ok(())
        }
        Decision::Denied(reason) => {
            println!("DENY {} ({})", call.name(), reason.code());
            anyhow::bail!("{reason}")
        }
        Decision::Error(err) => Err(err.into()),
    }
}
