//! `warden classify`: run the local shell rules on a command and show why.
//!
//! No review, no audit, no pushback state.

use crate::policy::parser;
use crate::policy::types::SegmentVerdict;
use crate::shell::segment::split_segments;
use crate::shell::{aggregate, classify_segment};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;

pub fn run_classify(command: &[String], cwd: Option<PathBuf>) -> Result<()> {
    let text = command.join(" ");
    if text.trim().is_empty() {
        bail!("No command given. Usage: warden classify -- <command>");
    }

    let working_dir = match cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = parser::load();

    let mut verdicts = Vec::new();
    println!();
    for segment in split_segments(&text) {
        let verdict = classify_segment(&segment, &working_dir, &config);
        println!("  {} {}", colorize(&verdict), segment.bold());
        if let Some(reason) = verdict.reason() {
            println!("      {}", reason.dimmed());
        }
        verdicts.push(verdict);
    }

    let overall = aggregate(&verdicts);
    println!();
    println!("  {} {}", "─".repeat(20).dimmed(), colorize(&overall));
    if let Some(reason) = overall.reason() {
        println!("      {}", reason);
    }
    println!();
    Ok(())
}

fn colorize(verdict: &SegmentVerdict) -> String {
    let label = format!("{:<7}", verdict.label().to_uppercase());
    match verdict {
        SegmentVerdict::Allow => label.green().to_string(),
        SegmentVerdict::Deny(_) => label.red().bold().to_string(),
        SegmentVerdict::Ask(_) => label.yellow().to_string(),
        SegmentVerdict::Unknown => label.dimmed().to_string(),
    }
}
