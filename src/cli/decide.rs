//! `warden decide`: dry-run the full pipeline on one request.
//!
//! Pushback state lives in memory only and nothing is audited, so running
//! this never changes what the real hook will do next.

use crate::policy::{parser, Pipeline};
use crate::protocol::{HookOutput, ToolCallRequest, PRE_TOOL_USE};
use crate::pushback::MemoryStore;
use crate::review::{AdvisoryReviewer, ClaudeReviewer};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

pub async fn run_decide(file: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let event = match ToolCallRequest::parse(&raw) {
        Ok(request) => request.event_name,
        Err(e) => {
            eprintln!("  {} {} (the hook would fall through)", "ℹ".blue(), e);
            PRE_TOOL_USE.to_string()
        }
    };

    let config = parser::load();
    let ttl = Duration::from_secs(config.pushback_ttl_secs);
    let reviewer = AdvisoryReviewer::new(
        Box::new(ClaudeReviewer::new(config.reviewer.clone())),
        Box::new(MemoryStore::new(ttl)),
    );
    let pipeline = Pipeline::new(config).with_reviewer(reviewer);

    let verdict = pipeline.decide(&raw).await;
    match HookOutput::from_verdict(&verdict, &event) {
        Some(output) => println!("{}", output.to_json()?),
        None => eprintln!("  {} no opinion (empty output)", "ℹ".blue()),
    }
    Ok(())
}
