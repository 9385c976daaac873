//! `warden log`: browse the audit log.

use crate::audit::{AuditReader, LogFilter, VerdictFilter};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;

pub fn run_log(
    session_id: Option<&str>,
    verdict_filter: Option<&str>,
    limit: Option<usize>,
    summary_only: bool,
) -> Result<()> {
    let reader = AuditReader::new().context("Failed to initialize log reader")?;

    let entries = match session_id {
        Some(sid) => reader
            .read_session(sid)
            .with_context(|| format!("Failed to read session: {}", sid))?,
        None => reader.read_latest_session()?,
    };

    if entries.is_empty() {
        println!();
        println!("  {} No audit logs found.", "ℹ".blue());
        println!();
        return Ok(());
    }

    let verdict = verdict_filter
        .map(|v| v.parse::<VerdictFilter>().map_err(|e| anyhow!(e)))
        .transpose()?;
    let filter = LogFilter {
        verdict,
        tier: None,
        limit,
    };

    let summary = AuditReader::summarize(&entries);

    if summary_only {
        println!();
        println!("  Session: {}", summary.session_id.cyan());
        println!();
        println!(
            "  {} total | {} allowed | {} denied | {} asked | {} no opinion",
            summary.total.to_string().bold(),
            summary.allowed.to_string().green().bold(),
            summary.denied.to_string().red().bold(),
            summary.asked.to_string().yellow().bold(),
            summary.fell_through,
        );
        println!("  {} sent to advisory review", summary.reviewed);
        if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
            println!("  Duration: {}", format_duration((end - start).num_seconds()));
        }
        println!();
        return Ok(());
    }

    println!();
    println!("  Session: {}", summary.session_id.cyan());
    println!();
    for entry in AuditReader::filter_entries(&entries, &filter) {
        println!("  {}", AuditReader::format_entry(&entry));
    }
    println!();
    println!("  {} {}", "─".repeat(40).dimmed(), summary.one_line().dimmed());
    println!();

    Ok(())
}

pub fn run_log_list() -> Result<()> {
    let reader = AuditReader::new()?;
    let sessions = reader.list_sessions()?;

    if sessions.is_empty() {
        println!();
        println!("  {} No sessions found.", "ℹ".blue());
        println!();
        return Ok(());
    }

    println!();
    println!("  Available sessions:");
    println!();
    for session in &sessions {
        println!("  • {}", session);
    }
    println!();
    println!("  View a session: {}", "warden log --session <id>".dimmed());
    println!();

    Ok(())
}

fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
