//! Command families.
//!
//! Every parsed command is first sorted into exactly one family, and the
//! classifier then dispatches on the family. Family membership is decided by
//! the base command name (plus the flags, for forced removal).

use crate::policy::defaults::{
    MODE_COMMANDS, OUTPUT_COMMANDS, PLAIN_PATH_COMMANDS, REMOTE_QUERY_COMMANDS, SAFE_COMMANDS,
    SEARCH_COMMANDS, SYSTEM_INFO_COMMANDS, TOOLCHAIN_COMMANDS,
};
use crate::policy::types::PolicyConfig;
use crate::shell::command::Command;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// npm, pnpm, yarn, bun
    Node,
    Cargo,
    /// pip, pip3
    Pip,
    Go,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Every operand is a path.
    Plain,
    /// First operand is a pattern.
    Search,
    /// Paths come before the first expression.
    Find,
    /// First operand is a mode or owner.
    Mode,
    /// Only the output file is a path; inputs are read freely.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFamily {
    Safe,
    ExtraSafe,
    VersionControl,
    PackageManager(PackageManager),
    Toolchain,
    ForcedRemoval,
    PathBearing(PathKind),
    SystemInfo,
    RemoteQuery,
    Generic,
}

impl CommandFamily {
    /// Sort `cmd` into a family. Order mirrors rule precedence.
    pub fn of(cmd: &Command, config: &PolicyConfig) -> Self {
        let name = cmd.name.as_str();

        if SAFE_COMMANDS.contains(&name) {
            return CommandFamily::Safe;
        }
        if config.extra_safe_commands.contains(name) {
            return CommandFamily::ExtraSafe;
        }
        if name == "git" {
            return CommandFamily::VersionControl;
        }
        if let Some(pm) = package_manager(name) {
            return CommandFamily::PackageManager(pm);
        }
        if TOOLCHAIN_COMMANDS.contains(&name) {
            return CommandFamily::Toolchain;
        }
        if name == "rm" && is_forced_recursive(cmd) {
            return CommandFamily::ForcedRemoval;
        }
        if PLAIN_PATH_COMMANDS.contains(&name) {
            return CommandFamily::PathBearing(PathKind::Plain);
        }
        if SEARCH_COMMANDS.contains(&name) {
            return CommandFamily::PathBearing(PathKind::Search);
        }
        if name == "find" {
            return CommandFamily::PathBearing(PathKind::Find);
        }
        if MODE_COMMANDS.contains(&name) {
            return CommandFamily::PathBearing(PathKind::Mode);
        }
        if OUTPUT_COMMANDS.contains(&name) {
            return CommandFamily::PathBearing(PathKind::Output);
        }
        if SYSTEM_INFO_COMMANDS.contains(&name) {
            return CommandFamily::SystemInfo;
        }
        if REMOTE_QUERY_COMMANDS.contains(&name) {
            return CommandFamily::RemoteQuery;
        }
        CommandFamily::Generic
    }
}

fn is_forced_recursive(cmd: &Command) -> bool {
    let recursive =
        cmd.has_short_or_long('r', "recursive") || cmd.has_short_or_long('R', "recursive");
    recursive && cmd.has_short_or_long('f', "force")
}

fn package_manager(name: &str) -> Option<PackageManager> {
    match name {
        "npm" | "pnpm" | "yarn" | "bun" => Some(PackageManager::Node),
        "cargo" => Some(PackageManager::Cargo),
        "pip" | "pip3" => Some(PackageManager::Pip),
        "go" => Some(PackageManager::Go),
        _ => None,
    }
}

impl fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandFamily::Safe => write!(f, "safe"),
            CommandFamily::ExtraSafe => write!(f, "extra-safe"),
            CommandFamily::VersionControl => write!(f, "version-control"),
            CommandFamily::PackageManager(_) => write!(f, "package-manager"),
            CommandFamily::Toolchain => write!(f, "toolchain"),
            CommandFamily::ForcedRemoval => write!(f, "forced-removal"),
            CommandFamily::PathBearing(_) => write!(f, "path-bearing"),
            CommandFamily::SystemInfo => write!(f, "system-info"),
            CommandFamily::RemoteQuery => write!(f, "remote-query"),
            CommandFamily::Generic => write!(f, "generic"),
        }
    }
}
