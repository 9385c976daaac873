//! `warden check`: validate a config file and lint it.
//!
//! The hook itself never fails on a bad config (it uses defaults), so this
//! is the only place parse errors surface.

use crate::policy::linter::lint_config;
use crate::policy::parser;
use crate::utils::state;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run_check(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => state::config_path()?,
    };

    if !path.exists() {
        println!();
        println!(
            "  {} No config at {}; built-in defaults apply.",
            "ℹ".blue(),
            path.display()
        );
        println!("  Create one with: {}", "warden init".dimmed());
        println!();
        return Ok(());
    }

    let raw = parser::parse_config_file(&path)?;
    let config = raw.to_config();

    println!();
    println!("  {} Config is valid!", "✓".green().bold());
    println!("  File: {}", path.display().to_string().dimmed());
    println!();
    println!(
        "  Advisory review: {}",
        if config.review_enabled {
            format!(
                "{} (timeout {}s)",
                config.reviewer.program.cyan(),
                config.reviewer.timeout_secs
            )
        } else {
            "disabled".yellow().to_string()
        }
    );
    println!("  Pushback TTL:    {}s", config.pushback_ttl_secs);
    println!("  Allowed paths:   /tmp (built-in)");
    for entry in &config.allowed_paths {
        println!("                   {}", entry);
    }
    if !config.extra_safe_commands.is_empty() {
        let names: Vec<&str> = config.extra_safe_commands.iter().map(String::as_str).collect();
        println!("  Extra safe:      {}", names.join(", "));
    }

    let warnings = lint_config(&raw);
    if !warnings.is_empty() {
        println!();
        println!(
            "  {} {} {}:",
            "─".repeat(20).dimmed(),
            warnings.len(),
            if warnings.len() == 1 {
                "suggestion"
            } else {
                "suggestions"
            }
        );
        println!();
        for warning in &warnings {
            println!("{}", warning.display());
        }
    } else {
        println!();
        println!("  {} No issues found.", "✓".green());
    }

    println!();
    Ok(())
}
