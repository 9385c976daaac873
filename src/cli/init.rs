//! `warden init`: write a starter config file.

use crate::policy::defaults::DEFAULT_CONFIG_JSON;
use crate::utils::state;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;

pub fn run_init(force: bool) -> Result<()> {
    let path = state::config_path()?;

    if path.exists() && !force {
        println!(
            "{} A config file already exists at {}",
            "⚠".yellow(),
            path.display()
        );
        println!("  Use --force to overwrite it, or edit it directly.");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG_JSON)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!();
    println!(
        "  {} Created {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    println!();
    println!("  {} What this config does:", "ℹ".blue());
    println!("    • Allows read-only shell commands and file access under /tmp");
    println!("    • Blocks recursive forced removal outside /tmp");
    println!("    • Asks before git push and package installs");
    println!("    • Sends anything else to an advisory reviewer before asking you");
    println!();
    println!("  {} Next steps:", "→".blue());
    println!(
        "    1. Add your project to allowedPaths: {}",
        format!("$EDITOR {}", path.display()).dimmed()
    );
    println!(
        "    2. Register the hook: {}",
        "PreToolUse → warden-hook".dimmed()
    );
    println!("    3. Validate: {}", "warden check".dimmed());
    println!();

    Ok(())
}
