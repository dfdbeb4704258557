use std::path::PathBuf;

use clap::{Args, Subcommand};

use warden_store::TraceProblem;

use super::open_store;
use crate::output::{header, kv};

#[derive(Args)]
pub struct TraceArgs {
    #[command(subcommand)]
    command: TraceCommand,
}

#[derive(Subcommand)]
enum TraceCommand {
    /// Print trace records, oldest first
    Show {
        /// Only records made under this intent
        #[arg(short, long)]
        intent: Option<String>,
        /// Only the last N records
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Emit raw JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Check record hashes, the hash chain and timestamp order
    Verify,
}

pub fn run(args: TraceArgs, root: Option<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match args.command {
        TraceCommand::Show {
            intent,
            limit,
            json,
        } => {
            let records: Vec<_> = store
                .read_trace()?
                .into_iter()
                .filter(|r| match &intent {
                    Some(id) => r.intent_id.as_ref().is_some_and(|i| i.as_str() == id),
                    None => true,
                })
                .collect();
            let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
            if records.is_empty() {
                println!("No trace records.");
            }
            for record in records.iter().skip(skip) {
                if json {
                    println!("{}", serde_json::to_string(record)?);
                    continue;
                }
                println!("{}", header(&record.id.to_string()));
                println!("{}", kv("Time (ms)", &record.timestamp_ms.to_string()));
                println!(
                    "{}",
                    kv(
                        "Intent",
                        record.intent_id.as_ref().map_or("-", |i| i.as_str())
                    )
                );
                println!("{}", kv("Session", record.session_id.as_str()));
                println!("{}", kv("Tool", &record.tool));
                println!("{}", kv("Target", &record.target));
                println!("{}", kv("Fingerprint", &record.content_fingerprint));
                println!("{}", kv("Succeeded", &record.succeeded.to_string()));
                println!("{}", kv("Summary", &record.result_summary));
                for (key, value) in &record.context {
                    println!("{}", kv(key, &value.to_string()));
                }
                println!("{}", kv("Hash", &record.record_hash.short()));
            }
        }
        TraceCommand::Verify => {
            let report = store.verify_trace()?;
            if report.is_clean() {
                println!("{} records verified, chain intact.", report.records);
                return Ok(());
            }
            for problem in &report.problems {
                match problem {
                    TraceProblem::Unparseable { line, message } => {
                        println!("line {line}: unparseable record: {message}")
                    }
                    TraceProblem::Tampered { line } => {
                        println!("line {line}: record hash does not match its content")
                    }
                    TraceProblem::BrokenChain { line } => {
                        println!("line {line}: prev_hash does not match the preceding record")
                    }
                    TraceProblem::NonMonotonicTimestamp { line } => {
                        println!("line {line}: timestamp does not increase")
                    }
                }
            }
            anyhow::bail!(
                "trace verification failed: {} problem(s) in {} records",
                report.problems.len(),
                report.records
            );
        }
    }
    Ok(())
}
