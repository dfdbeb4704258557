use std::path::PathBuf;

use clap::{Args, Subcommand};

use warden_core::IntentId;
use warden_policy::IntentContext;

use super::open_store;
use crate::output::{header, kv};

#[derive(Args)]
pub struct IntentArgs {
    #[command(subcommand)]
    command: IntentCommand,
}

#[derive(Subcommand)]
enum IntentCommand {
    /// List declared intents
    List,
    /// Show one intent as the agent would receive it
    Show {
        /// Intent ID
        id: String,
    },
    /// Report duplicate ids and intents that cannot authorize anything
    Check,
}

pub fn run(args: IntentArgs, root: Option<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let set = store.intents().load()?;
    match args.command {
        IntentCommand::List => {
            if set.is_empty() {
                println!("No intents declared.");
            }
            for intent in set.iter() {
                println!(
                    "{} {} {} ({} scope entries)",
                    intent.id,
                    intent.status.as_str(),
                    intent.name,
                    intent.owned_scope.len()
                );
            }
        }
        IntentCommand::Show { id } => {
            let id = IntentId::new(id);
            let intent = set
                .get(&id)?
                .ok_or_else(|| anyhow::anyhow!("intent not found: {id}"))?;
            println!("{}", header(&format!("Intent {}", intent.id)));
            println!("{}", kv("Name", &intent.name));
            println!("{}", kv("Status", intent.status.as_str()));
            println!();
            print!("{}", IntentContext::new(intent.clone()).render());
        }
        IntentCommand::Check => {
            let issues = set.integrity_issues();
            if issues.is_empty() {
                println!("{} intents, no issues.", set.len());
                return Ok(());
            }
            for issue in &issues {
                println!("{issue}");
            }
            anyhow::bail!("{} integrity issue(s) in the intent store", issues.len());
        }
    }
    Ok(())
}
