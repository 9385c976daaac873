//! Config Store: loads `config.json` into a [`PolicyConfig`].
//!
//! Two entry points:
//! - [`load`] / [`load_from`] never fail. Any problem (missing file, bad
//!   JSON, unreadable state dir) yields the defaults, because a hook that
//!   errors out on a config typo would block the agent.
//! - [`load_strict`] / [`parse_config_file`] report errors; `warden check`
//!   uses them.
//!
//! # Example config file:
//! ```json
//! {
//!   "version": 1,
//!   "reviewEnabled": true,
//!   "allowedPaths": ["~/code/myproject", "/srv/shared"],
//!   "extraSafeCommands": ["kubectl"],
//!   "reviewer": { "model": "haiku", "timeoutSecs": 30 }
//! }
//! ```

use crate::policy::types::*;
use crate::utils::state;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// The config as written, before entries are normalized into sets.
/// Kept separately so the linter can see duplicates and blanks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    pub version: Option<u32>,
    pub review_enabled: Option<bool>,
    pub allowed_paths: Option<StringOrVec>,
    pub extra_safe_commands: Option<StringOrVec>,
    pub reviewer: ReviewerConfig,
    pub pushback_ttl_secs: Option<u64>,
}

/// List fields may be a single string or a list of strings:
/// ```json
/// "allowedPaths": "/srv/shared"
/// "allowedPaths": ["/srv/shared", "~/code"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrVec {
    Single(String),
    Multiple(Vec<String>),
}

impl StringOrVec {
    pub fn as_slice(&self) -> &[String] {
        match self {
            StringOrVec::Single(s) => std::slice::from_ref(s),
            StringOrVec::Multiple(v) => v,
        }
    }
}

impl RawConfig {
    pub fn allowed_paths(&self) -> &[String] {
        self.allowed_paths.as_ref().map_or(&[], StringOrVec::as_slice)
    }

    pub fn extra_safe_commands(&self) -> &[String] {
        self.extra_safe_commands
            .as_ref()
            .map_or(&[], StringOrVec::as_slice)
    }

    /// Normalize into the immutable config: entries trimmed, blanks dropped.
    pub fn to_config(&self) -> PolicyConfig {
        let defaults = PolicyConfig::default();
        let clean = |entries: &[String]| {
            entries
                .iter()
                .map(|e| e.trim())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect()
        };

        PolicyConfig {
            version: self.version.unwrap_or(defaults.version),
            review_enabled: self.review_enabled.unwrap_or(defaults.review_enabled),
            allowed_paths: clean(self.allowed_paths()),
            extra_safe_commands: clean(self.extra_safe_commands()),
            reviewer: self.reviewer.clone(),
            pushback_ttl_secs: self.pushback_ttl_secs.unwrap_or(defaults.pushback_ttl_secs),
        }
    }
}

/// Load the config from the default location. Never fails.
pub fn load() -> PolicyConfig {
    match state::config_path() {
        Ok(path) => load_from(&path),
        Err(e) => {
            tracing::warn!(error = %e, "cannot locate config, using defaults");
            PolicyConfig::default()
        }
    }
}

/// Load the config from `path`. Never fails.
pub fn load_from(path: &Path) -> PolicyConfig {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return PolicyConfig::default();
    }
    match parse_config_file(path) {
        Ok(raw) => raw.to_config(),
        Err(e) => {
            tracing::warn!(error = format!("{:#}", e), "invalid config, using defaults");
            PolicyConfig::default()
        }
    }
}

/// Load the config from `path`, reporting errors. Used by `warden check`.
pub fn load_strict(path: &Path) -> Result<PolicyConfig> {
    Ok(parse_config_file(path)?.to_config())
}

/// Parse a config file, reporting errors.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config JSON.
pub fn parse_config_str(json: &str) -> Result<RawConfig> {
    let raw: RawConfig = serde_json::from_str(json).context("Invalid JSON in config file")?;

    if let Some(version) = raw.version {
        if version > CONFIG_VERSION {
            tracing::warn!(
                version,
                supported = CONFIG_VERSION,
                "config written by a newer warden; unknown fields are ignored"
            );
        }
    }

    Ok(raw)
}
