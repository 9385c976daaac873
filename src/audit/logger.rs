//! Audit log writer: append-only JSONL, one file per session.
//!
//! Writes to `<state>/logs/{session_id}.jsonl` and flushes after every
//! entry. Callers treat failures as non-fatal.

use crate::audit::types::AuditEntry;
use crate::utils::state;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Session id used when the host doesn't send one.
pub const DEFAULT_SESSION: &str = "default";

pub struct AuditLogger {
    log_path: PathBuf,
    file: File,
    entry_count: usize,
}

impl AuditLogger {
    /// Logger for `session_id` under the state directory.
    pub fn new(session_id: &str) -> Result<Self> {
        Self::in_dir(state::log_dir()?, session_id)
    }

    /// Logger for `session_id` under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, session_id: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        Self::with_path(dir.join(format!("{}.jsonl", session_file_stem(session_id))))
    }

    /// Logger writing to a specific file.
    pub fn with_path(path: impl AsRef<Path>) -> Result<Self> {
        let log_path = path.as_ref().to_path_buf();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

        Ok(Self {
            log_path,
            file,
            entry_count: 0,
        })
    }

    /// Append one entry as a single line.
    pub fn record(&mut self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).context("Failed to serialize log entry")?;
        line.push('\n');
        // one write per line keeps concurrent appends from interleaving
        self.file
            .write_all(line.as_bytes())
            .context("Failed to write log entry")?;
        self.file.flush().context("Failed to flush log file")?;
        self.entry_count += 1;
        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }
}

/// Session ids come from the host; keep them to a safe file name.
pub fn session_file_stem(session_id: &str) -> String {
    let stem: String = session_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        DEFAULT_SESSION.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::Tier;
    use crate::policy::types::Verdict;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(target: &str) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            session_id: "test-session".to_string(),
            action_kind: "Write".to_string(),
            target: target.to_string(),
            verdict: Verdict::allow_because("path is authorized"),
            tier: Tier::Rules,
            detail: None,
            eval_duration_us: Some(42),
        }
    }

    #[test]
    fn test_write_and_read_log() {
        let tmp = TempDir::new().unwrap();
        let log_path = tmp.path().join("test.jsonl");
        let mut logger = AuditLogger::with_path(&log_path).unwrap();

        logger.record(&entry("/tmp/x.rs")).unwrap();
        assert_eq!(logger.entry_count(), 1);

        let content = fs::read_to_string(&log_path).unwrap();
        let parsed: AuditEntry = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed.session_id, "test-session");
        assert_eq!(parsed.target, "/tmp/x.rs");
    }

    #[test]
    fn test_append_only() {
        let tmp = TempDir::new().unwrap();
        let log_path = tmp.path().join("test.jsonl");

        for i in 0..3 {
            // a fresh logger per decision, as the hook does
            let mut logger = AuditLogger::with_path(&log_path).unwrap();
            logger.record(&entry(&format!("file_{}.rs", i))).unwrap();
        }

        let content = fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.trim().lines().count(), 3);
    }

    #[test]
    fn test_session_file_names() {
        let tmp = TempDir::new().unwrap();
        let logger = AuditLogger::in_dir(tmp.path(), "../../etc/passwd").unwrap();
        assert_eq!(logger.log_path().parent().unwrap(), tmp.path());
        assert_eq!(session_file_stem(""), "default");
        assert_eq!(session_file_stem("abc-123_x"), "abc-123_x");
    }
}
