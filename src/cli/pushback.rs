//! `warden pushback`: inspect or clear outstanding pushback records.

use crate::policy::parser;
use crate::pushback::{FileStore, PushbackStore};
use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::time::Duration;

fn store() -> Result<FileStore> {
    let config = parser::load();
    FileStore::new(Duration::from_secs(config.pushback_ttl_secs))
}

pub fn run_pushback_list() -> Result<()> {
    let store = store()?;
    let purged = store.purge_expired()?;
    let records = store.list()?;

    println!();
    if records.is_empty() {
        println!("  {} No outstanding pushbacks.", "ℹ".blue());
    } else {
        for record in &records {
            let age = (Utc::now() - record.created_at).num_seconds().max(0);
            println!(
                "  {} {}",
                record.request_hash.bold(),
                format!("({}s ago)", age).dimmed()
            );
        }
    }
    if purged > 0 {
        println!("  {}", format!("{} expired record(s) removed", purged).dimmed());
    }
    println!();
    Ok(())
}

/// Clear one record, or all of them when `hash` is `None`.
pub fn run_pushback_clear(hash: Option<&str>) -> Result<()> {
    let store = store()?;

    let cleared = match hash {
        Some(hash) => {
            store.clear(hash)?;
            1
        }
        None => {
            let records = store.list()?;
            for record in &records {
                store.clear(&record.request_hash)?;
            }
            records.len()
        }
    };

    println!(
        "  {} Cleared {} pushback record(s)",
        "✓".green().bold(),
        cleared
    );
    Ok(())
}
