use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;

use commands::Commands;

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Intent-scoped write governance for autonomous agents"
)]
struct Cli {
    /// Project root (defaults to the nearest directory containing .orchestration)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    // stdout carries hook protocol responses; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.run(cli.root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error::format_error(&err));
            ExitCode::FAILURE
        }
    }
}
