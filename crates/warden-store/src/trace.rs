use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use warden_core::types::{TraceDraft, TraceRecord};
use warden_core::RecordHash;

use crate::lockfile::LockFile;
use crate::StoreError;

const LOCK_ATTEMPTS: u32 = 50;
const LOCK_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Default, Clone)]
struct TailState {
    len: u64,
    last_hash: Option<RecordHash>,
    last_timestamp_ms: u64,
    records: usize,
    /// The file ends mid-line, so the next record must start on a new one.
    torn_tail: bool,
}

/// Append-only writer for the JSON-lines trace log.
///
/// Appends are serialized in-process by a mutex and across processes by a
/// `.lock` file next to the log. Each record goes out as a single
/// `write_all` of one complete line.
pub struct TraceWriter {
    path: PathBuf,
    tail: Mutex<Option<TailState>>,
}

impl TraceWriter {
    /// The log is scanned lazily on first use, so a damaged log surfaces as
    /// an append failure rather than preventing construction.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            tail: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the log as of this writer's last append or scan.
    pub fn record_count(&self) -> Result<usize, StoreError> {
        let mut tail = self
            .tail
            .lock()
            .map_err(|_| StoreError::LockPoisoned(self.path.clone()))?;
        if tail.is_none() {
            *tail = Some(scan_tail(&self.path)?);
        }
        Ok(tail.as_ref().map_or(0, |t| t.records))
    }

    pub fn append(&self, draft: TraceDraft) -> Result<TraceRecord, StoreError> {
        let mut tail = self
            .tail
            .lock()
            .map_err(|_| StoreError::LockPoisoned(self.path.clone()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let _lock = LockFile::acquire_with_retry(&self.path, LOCK_ATTEMPTS, LOCK_BACKOFF)?;

        // Another process may have appended since we last looked.
        let current_len = file_len(&self.path)?;
        let mut state = match tail.take() {
            Some(t) if t.len == current_len => t,
            _ => scan_tail(&self.path)?,
        };

        let timestamp_ms = now_ms().max(state.last_timestamp_ms.saturating_add(1));
        let record = TraceRecord::seal(draft, timestamp_ms, state.last_hash)?;
        let mut line = record.to_line()?;
        if state.torn_tail {
            line.insert(0, '\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;

        state.len += line.len() as u64;
        state.last_hash = Some(record.record_hash);
        state.last_timestamp_ms = record.timestamp_ms;
        state.records += 1;
        state.torn_tail = false;
        *tail = Some(state);
        tracing::debug!(
            id = %record.id,
            tool = %record.tool,
            target = %record.target,
            "trace record appended"
        );
        Ok(record)
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn file_len(path: &Path) -> Result<u64, StoreError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Find where the chain continues. Damaged lines at the end of the log (a
/// torn write, say) are skipped with a warning so later appends still land;
/// `verify_trace` keeps reporting them.
fn scan_tail(path: &Path) -> Result<TailState, StoreError> {
    if !path.exists() {
        return Ok(TailState::default());
    }
    let content = std::fs::read_to_string(path)?;
    let mut state = TailState {
        len: content.len() as u64,
        torn_tail: !content.is_empty() && !content.ends_with('\n'),
        ..TailState::default()
    };
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
        .collect();
    state.records = lines.len();
    for &(line_no, line) in lines.iter().rev() {
        match parse_line(line, line_no) {
            Ok(record) => {
                state.last_hash = Some(record.record_hash);
                state.last_timestamp_ms = record.timestamp_ms;
                break;
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "damaged trace line, continuing the chain from the last readable record"
                );
            }
        }
    }
    Ok(state)
}

fn parse_line(line: &str, line_no: usize) -> Result<TraceRecord, StoreError> {
    serde_json::from_str(line).map_err(|e| StoreError::TraceCorrupt {
        line: line_no,
        message: e.to_string(),
    })
}

/// Parse every record. Each line stands alone; the first malformed line
/// fails the read with its 1-based line number.
pub fn read_trace(path: &Path) -> Result<Vec<TraceRecord>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_line(line, idx + 1)?);
    }
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceProblem {
    Unparseable { line: usize, message: String },
    Tampered { line: usize },
    BrokenChain { line: usize },
    NonMonotonicTimestamp { line: usize },
}

#[derive(Debug, Clone, Default)]
pub struct TraceVerification {
    pub records: usize,
    pub problems: Vec<TraceProblem>,
}

impl TraceVerification {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check every record's hash, the `prev_hash` chain and timestamp order.
pub fn verify_trace(path: &Path) -> Result<TraceVerification, StoreError> {
    let mut report = TraceVerification::default();
    if !path.exists() {
        return Ok(report);
    }
    let content = std::fs::read_to_string(path)?;
    let mut prev: Option<TraceRecord> = None;
    // After an unparseable line the expected predecessor is unknown.
    let mut chain_known = true;
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        report.records += 1;
        let record = match parse_line(line, line_no) {
            Ok(r) => r,
            Err(e) => {
                report.problems.push(TraceProblem::Unparseable {
                    line: line_no,
                    message: e.to_string(),
                });
                prev = None;
                chain_known = false;
                continue;
            }
        };
        if !record.is_intact() {
            report.problems.push(TraceProblem::Tampered { line: line_no });
        }
        let expected_prev = prev.as_ref().map(|p| p.record_hash);
        if chain_known && record.prev_hash != expected_prev {
            report.problems.push(TraceProblem::BrokenChain { line: line_no });
        }
        if let Some(p) = &prev {
            if record.timestamp_ms <= p.timestamp_ms {
                report
                    .problems
                    .push(TraceProblem::NonMonotonicTimestamp { line: line_no });
            }
        }
        prev = Some(record);
        chain_known = true;
    }
    Ok(report)
}
