//! Audit log reader: filter and display session logs for `warden log`.

use crate::audit::types::*;
use crate::policy::types::Verdict;
use crate::utils::state;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct AuditReader {
    log_dir: PathBuf,
}

impl AuditReader {
    /// Reader over `<state>/logs`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(state::log_dir()?))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn read_session(&self, session_id: &str) -> Result<Vec<AuditEntry>> {
        let stem = crate::audit::logger::session_file_stem(session_id);
        self.read_file(&self.log_dir.join(format!("{}.jsonl", stem)))
    }

    /// Lines that don't parse are skipped: a concurrent writer may have
    /// left a partial line, and one bad line shouldn't hide the rest.
    fn read_file(&self, path: &Path) -> Result<Vec<AuditEntry>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file: {}", path.display()))?;

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .filter_map(|(i, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(line = i + 1, error = %e, "skipping unreadable log entry");
                    None
                }
            })
            .collect())
    }

    pub fn read_latest_session(&self) -> Result<Vec<AuditEntry>> {
        match self.find_latest_session()? {
            Some(path) => self.read_file(&path),
            None => Ok(Vec::new()),
        }
    }

    fn session_files(&self) -> Result<Vec<PathBuf>> {
        if !self.log_dir.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_dir(&self.log_dir)
            .with_context(|| format!("Failed to read log directory: {}", self.log_dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |e| e == "jsonl"))
            .collect())
    }

    fn find_latest_session(&self) -> Result<Option<PathBuf>> {
        let mut files = self.session_files()?;
        files.sort_by(|a, b| {
            let a_time = fs::metadata(a).and_then(|m| m.modified()).ok();
            let b_time = fs::metadata(b).and_then(|m| m.modified()).ok();
            b_time.cmp(&a_time)
        });
        Ok(files.into_iter().next())
    }

    pub fn list_sessions(&self) -> Result<Vec<String>> {
        let mut sessions: Vec<String> = self
            .session_files()?
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        sessions.sort();
        Ok(sessions)
    }

    /// Apply `filter`. With a limit, the most recent matching entries are kept.
    pub fn filter_entries(entries: &[AuditEntry], filter: &LogFilter) -> Vec<AuditEntry> {
        let matching: Vec<&AuditEntry> = entries
            .iter()
            .filter(|e| filter.verdict.map_or(true, |v| v.matches(&e.verdict)))
            .filter(|e| filter.tier.map_or(true, |t| e.tier == t))
            .collect();

        let skip = filter
            .limit
            .map_or(0, |limit| matching.len().saturating_sub(limit));
        matching.into_iter().skip(skip).cloned().collect()
    }

    pub fn summarize(entries: &[AuditEntry]) -> SessionSummary {
        let mut summary = SessionSummary::default();

        if let Some(first) = entries.first() {
            summary.session_id = first.session_id.clone();
            summary.start_time = Some(first.timestamp);
        }
        if let Some(last) = entries.last() {
            summary.end_time = Some(last.timestamp);
        }

        summary.total = entries.len();
        for entry in entries {
            match &entry.verdict {
                Verdict::Allow { .. } => summary.allowed += 1,
                Verdict::Deny { .. } => summary.denied += 1,
                Verdict::Ask { .. } => summary.asked += 1,
                Verdict::FallThrough => summary.fell_through += 1,
            }
            if entry.tier == Tier::Review {
                summary.reviewed += 1;
            }
        }

        summary
    }

    /// One terminal line per entry.
    pub fn format_entry(entry: &AuditEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S").to_string();
        let verdict = match &entry.verdict {
            Verdict::Allow { .. } => "ALLOW".green().to_string(),
            Verdict::Deny { .. } => "DENY".red().to_string(),
            Verdict::Ask { .. } => "ASK".yellow().to_string(),
            Verdict::FallThrough => "PASS".dimmed().to_string(),
        };

        let target: String = entry.target.chars().take(80).collect();
        let mut line = format!(
            "[{}] {} {} -> {} ({})",
            timestamp.dimmed(),
            verdict,
            entry.action_kind.bold(),
            target,
            entry.tier.to_string().dimmed()
        );

        if let Some(reason) = entry.verdict.reason() {
            line.push_str(&format!("\n           {}", reason.dimmed()));
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLogger;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(verdict: Verdict, tier: Tier) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            session_id: "s1".to_string(),
            action_kind: "Bash".to_string(),
            target: "ls".to_string(),
            verdict,
            tier,
            detail: None,
            eval_duration_us: None,
        }
    }

    fn sample() -> Vec<AuditEntry> {
        vec![
            entry(Verdict::allow(), Tier::Rules),
            entry(Verdict::deny("rm"), Tier::Rules),
            entry(Verdict::ask("push"), Tier::Rules),
            entry(Verdict::allow_because("ok"), Tier::Review),
            entry(Verdict::FallThrough, Tier::None),
        ]
    }

    #[test]
    fn test_summarize() {
        let summary = AuditReader::summarize(&sample());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.allowed, 2);
        assert_eq!(summary.denied, 1);
        assert_eq!(summary.asked, 1);
        assert_eq!(summary.fell_through, 1);
        assert_eq!(summary.reviewed, 1);
        assert_eq!(summary.session_id, "s1");
    }

    #[test]
    fn test_filter() {
        let entries = sample();
        let allowed = AuditReader::filter_entries(
            &entries,
            &LogFilter {
                verdict: Some(VerdictFilter::Allow),
                ..LogFilter::default()
            },
        );
        assert_eq!(allowed.len(), 2);

        let last_two = AuditReader::filter_entries(
            &entries,
            &LogFilter {
                limit: Some(2),
                ..LogFilter::default()
            },
        );
        assert_eq!(last_two.len(), 2);
        assert!(last_two[1].verdict.is_fall_through());

        let reviewed = AuditReader::filter_entries(
            &entries,
            &LogFilter {
                tier: Some(Tier::Review),
                ..LogFilter::default()
            },
        );
        assert_eq!(reviewed.len(), 1);
    }

    #[test]
    fn test_sessions_and_latest() {
        let tmp = TempDir::new().unwrap();
        let reader = AuditReader::with_dir(tmp.path());
        assert!(reader.list_sessions().unwrap().is_empty());
        assert!(reader.read_latest_session().unwrap().is_empty());

        let mut logger = AuditLogger::in_dir(tmp.path(), "alpha").unwrap();
        logger.record(&entry(Verdict::allow(), Tier::Rules)).unwrap();
        let mut logger = AuditLogger::in_dir(tmp.path(), "beta").unwrap();
        logger.record(&entry(Verdict::deny("x"), Tier::Rules)).unwrap();

        assert_eq!(reader.list_sessions().unwrap(), vec!["alpha", "beta"]);
        assert_eq!(reader.read_session("alpha").unwrap().len(), 1);
    }

    #[test]
    fn test_partial_lines_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.jsonl");
        let good = serde_json::to_string(&entry(Verdict::allow(), Tier::Rules)).unwrap();
        fs::write(&path, format!("{}\n{{\"truncated\n", good)).unwrap();
        assert_eq!(AuditReader::with_dir(tmp.path()).read_session("s").unwrap().len(), 1);
    }

    #[test]
    fn test_format_entry_includes_reason() {
        colored::control::set_override(false);
        let line = AuditReader::format_entry(&entry(Verdict::deny("outside scratch"), Tier::Rules));
        assert!(line.contains("DENY"));
        assert!(line.contains("outside scratch"));
    }
}
