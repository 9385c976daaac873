//! Locations of warden's durable state.
//!
//! Everything lives under one directory: `$WARDEN_HOME`, or `~/.warden`.

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const HOME_ENV: &str = "WARDEN_HOME";
pub const CONFIG_ENV: &str = "WARDEN_CONFIG";

/// Root state directory.
pub fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".warden"))
}

/// Config file path (`$WARDEN_CONFIG` wins over the state directory).
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(state_dir()?.join("config.json"))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("logs"))
}

pub fn pushback_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("pushback"))
}
