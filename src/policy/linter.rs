//! Config linter: flags settings that are legal but probably not meant.
//!
//! `warden check` runs it over the raw config so duplicates and blank
//! entries are still visible. Nothing here changes how a request is decided.

use crate::policy::parser::RawConfig;
use crate::utils::paths;
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Longest reviewer timeout that still leaves the host responsive.
const MAX_SANE_TIMEOUT_SECS: u64 = 120;

/// Commands with their own subcommand rules. Marking them safe skips those rules.
const SHADOWED_COMMANDS: &[&str] = &[
    "rm", "git", "npm", "pnpm", "yarn", "bun", "cargo", "pip", "pip3", "go", "gh", "glab",
];

/// A lint warning: something the user should know about their config.
#[derive(Debug)]
pub struct LintWarning {
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Severity {
    /// Widens what gets allowed without review
    Warning,
    /// Harmless but likely a mistake
    Info,
}

impl LintWarning {
    fn warn(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: None,
        }
    }

    fn warn_with_fix(msg: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: Some(fix.into()),
        }
    }

    fn info(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: msg.into(),
            suggestion: None,
        }
    }

    /// Format for terminal output.
    pub fn display(&self) -> String {
        let icon = match self.severity {
            Severity::Warning => "⚠".yellow().to_string(),
            Severity::Info => "ℹ".blue().to_string(),
        };
        let mut out = format!("  {} {}", icon, self.message);
        if let Some(ref suggestion) = self.suggestion {
            out.push_str(&format!("\n    {}: {}", "Fix".green(), suggestion));
        }
        out
    }
}

/// Lint a config and return warnings.
pub fn lint_config(raw: &RawConfig) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    check_allowed_paths(raw, &mut warnings);
    check_shadowed_commands(raw, &mut warnings);
    check_duplicates("allowedPaths", raw.allowed_paths(), &mut warnings);
    check_duplicates("extraSafeCommands", raw.extra_safe_commands(), &mut warnings);
    check_reviewer(raw, &mut warnings);

    warnings
}

fn check_allowed_paths(raw: &RawConfig, warnings: &mut Vec<LintWarning>) {
    for entry in raw.allowed_paths() {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            warnings.push(LintWarning::info("allowedPaths has a blank entry; it is ignored"));
            continue;
        }
        if trimmed.split('/').any(|c| c == "..") {
            warnings.push(LintWarning::warn_with_fix(
                format!("allowedPaths entry '{}' contains '..'; it is ignored", trimmed),
                "Write the directory out without '..'",
            ));
            continue;
        }
        match paths::allowed_root(trimmed) {
            None => warnings.push(LintWarning::warn_with_fix(
                format!("allowedPaths entry '{}' is not absolute; it is ignored", trimmed),
                "Use an absolute path or one starting with ~/",
            )),
            Some(root) if root == Path::new("/") => warnings.push(LintWarning::warn(format!(
                "allowedPaths entry '{}' authorizes the whole filesystem",
                trimmed
            ))),
            Some(_) => {}
        }
    }
}

fn check_shadowed_commands(raw: &RawConfig, warnings: &mut Vec<LintWarning>) {
    for entry in raw.extra_safe_commands() {
        let name = entry.trim();
        if SHADOWED_COMMANDS.contains(&name) {
            warnings.push(LintWarning::warn_with_fix(
                format!(
                    "extraSafeCommands lists '{}', which bypasses its built-in rules and allows every invocation",
                    name
                ),
                format!("Remove '{}' from extraSafeCommands", name),
            ));
        }
    }
}

fn check_duplicates(field: &str, entries: &[String], warnings: &mut Vec<LintWarning>) {
    let mut seen = HashSet::new();
    for entry in entries {
        let trimmed = entry.trim();
        if !trimmed.is_empty() && !seen.insert(trimmed) {
            warnings.push(LintWarning::info(format!(
                "{} lists '{}' more than once",
                field, trimmed
            )));
        }
    }
}

fn check_reviewer(raw: &RawConfig, warnings: &mut Vec<LintWarning>) {
    let config = raw.to_config();
    if !config.review_enabled {
        warnings.push(LintWarning::info(
            "Advisory review is disabled: anything the local rules can't settle goes straight to you",
        ));
        return;
    }

    let reviewer = &config.reviewer;
    if reviewer.timeout_secs == 0 {
        warnings.push(LintWarning::warn_with_fix(
            "reviewer.timeoutSecs is 0; every review will time out",
            "Set reviewer.timeoutSecs to something like 30",
        ));
    } else if reviewer.timeout_secs > MAX_SANE_TIMEOUT_SECS {
        warnings.push(LintWarning::info(format!(
            "reviewer.timeoutSecs is {}; the agent blocks for that long on a stuck review",
            reviewer.timeout_secs
        )));
    }

    if !on_path(&reviewer.program) {
        warnings.push(LintWarning::warn_with_fix(
            format!(
                "Reviewer program '{}' was not found; inconclusive requests will fall back to asking you",
                reviewer.program
            ),
            "Install it, set reviewer.program, or set reviewEnabled to false",
        ));
    }
}

fn on_path(program: &str) -> bool {
    if program.contains('/') {
        return Path::new(program).is_file();
    }
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}
