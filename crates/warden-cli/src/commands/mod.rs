pub mod check;
pub mod hook;
pub mod init;
pub mod intent;
pub mod trace;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;

use warden_core::types::ContextMetadata;
use warden_policy::{GovernanceEngine, SessionRegistry, StaticContext};
use warden_store::ProjectStore;

use crate::config::resolve_root;

#[derive(Subcommand)]
pub enum Commands {
    /// Create the .orchestration directory with default config and intents
    Init(init::InitArgs),
    /// Inspect declared intents
    Intent(intent::IntentArgs),
    /// Ask whether a tool call on a path would be authorized
    Check(check::CheckArgs),
    /// Serve the JSON-lines hook protocol on stdin/stdout
    Hook(hook::HookArgs),
    /// Inspect and verify the audit trace
    Trace(trace::TraceArgs),
}

impl Commands {
    pub fn run(self, root: Option<PathBuf>) -> anyhow::Result<()> {
        match self {
            Commands::Init(args) => init::run(args, root),
            Commands::Intent(args) => intent::run(args, root),
            Commands::Check(args) => check::run(args, root),
            Commands::Hook(args) => hook::run(args, root),
            Commands::Trace(args) => trace::run(args, root),
        }
    }
}

pub fn open_store(root: Option<PathBuf>) -> anyhow::Result<ProjectStore> {
    let root = resolve_root(root)?;
    Ok(ProjectStore::open(&root)?)
}

/// Build an engine from the project's config; `strict` only ever tightens it.
pub fn open_engine(
    store: &ProjectStore,
    strict: bool,
    meta: &[String],
) -> anyhow::Result<GovernanceEngine> {
    let mut config = store.config()?;
    config.strict_mode |= strict;
    let context = StaticContext::new(parse_meta(meta)?);
    Ok(GovernanceEngine::new(store, config, Arc::new(SessionRegistry::new())).with_context(context))
}

fn parse_meta(meta: &[String]) -> anyhow::Result<ContextMetadata> {
    let mut fields = ContextMetadata::new();
    for pair in meta {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--meta expects key=value, got {pair}"))?;
        fields.insert(key.trim().to_string(), serde_json::Value::from(value.trim()));
    }
    Ok(fields)
}
