use clap::Args;
use std::path::PathBuf;

use warden_store::ProjectStore;

#[derive(Args)]
pub struct InitArgs {
    /// Path to initialize (defaults to --root or the current directory)
    path: Option<PathBuf>,
}

pub fn run(args: InitArgs, root: Option<PathBuf>) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let path = match args.path.or(root) {
        Some(p) if p.is_absolute() => p,
        Some(p) => cwd.join(p),
        None => cwd,
    };

    let store = ProjectStore::init(&path)?;
    println!("Initialized governance at {}", store.layout().orchestration_dir().display());
    println!("  Intents: {}", store.layout().intents_file().display());
    println!("  Config: {}", store.layout().config_file().display());
    Ok(())
}
