//! Subcommand-aware rules for package managers (npm family, cargo, pip, go).

use crate::policy::defaults::FORCE_FLAGS;
use crate::policy::types::SegmentVerdict;
use crate::shell::command::Command;
use crate::shell::family::PackageManager;

struct Table {
    read_only: &'static [&'static str],
    mutating: &'static [&'static str],
}

const NODE: Table = Table {
    read_only: &[
        "ls", "list", "ll", "la", "view", "info", "show", "v", "outdated", "why", "explain",
        "test", "t", "tst", "run", "run-script", "start", "build", "lint", "typecheck", "help",
        "--version", "-v", "prefix", "root", "bin", "whoami", "doctor",
    ],
    mutating: &[
        "install", "i", "in", "isntall", "add", "ci", "remove", "rm", "r", "un", "uninstall",
        "unlink", "update", "up", "upgrade", "publish", "unpublish", "link", "dedupe", "prune",
        "version", "init", "create", "exec", "dlx", "x", "deprecate", "dist-tag", "owner",
        "access", "token", "login", "logout", "adduser", "set-script", "patch",
    ],
};

const CARGO: Table = Table {
    read_only: &[
        "build", "b", "check", "c", "test", "t", "clippy", "fmt", "doc", "d", "bench", "run", "r",
        "tree", "metadata", "search", "version", "--version", "-V", "help", "nextest",
        "locate-project", "verify-project", "pkgid", "read-manifest", "expand", "llvm-cov",
        "deny", "audit", "machete", "outdated",
    ],
    mutating: &[
        "install", "uninstall", "publish", "add", "remove", "rm", "update", "upgrade", "yank",
        "login", "logout", "owner", "new", "init", "clean", "fix", "vendor", "generate-lockfile",
    ],
};

const PIP: Table = Table {
    read_only: &["list", "show", "freeze", "check", "help", "--version", "-V", "search"],
    mutating: &["install", "uninstall", "download", "wheel", "cache", "config"],
};

const GO: Table = Table {
    read_only: &["build", "test", "vet", "fmt", "run", "list", "version", "doc", "help"],
    mutating: &["get", "install", "clean", "generate", "work", "fix"],
};

/// Classify a package-manager invocation. `None` leaves it unclassified.
pub fn classify_package_manager(pm: PackageManager, cmd: &Command) -> Option<SegmentVerdict> {
    let operands = cmd.operands();
    let Some(sub) = operands.first().copied() else {
        return Some(bare_invocation(cmd));
    };
    let second = operands.get(1).copied();
    let force = cmd.flags().find(|f| FORCE_FLAGS.contains(f));

    // Subcommands whose safety depends on what follows them.
    let special = match (pm, sub) {
        (PackageManager::Node, "audit") => Some(second != Some("fix")),
        (PackageManager::Node, "config") | (PackageManager::Node, "c") => {
            Some(matches!(second, Some("get") | Some("list") | Some("ls")))
        }
        (PackageManager::Go, "mod") => Some(matches!(second, Some("graph") | Some("why") | Some("verify"))),
        (PackageManager::Go, "env") => Some(!cmd.has_any_flag(&["-w", "-u"])),
        _ => None,
    };

    let table = match pm {
        PackageManager::Node => &NODE,
        PackageManager::Cargo => &CARGO,
        PackageManager::Pip => &PIP,
        PackageManager::Go => &GO,
    };

    let read_only = match special {
        Some(read_only) => read_only,
        None if table.read_only.contains(&sub) => true,
        None if table.mutating.contains(&sub) => false,
        None => return None,
    };

    if read_only {
        return match force {
            Some(_) => None,
            None => Some(SegmentVerdict::Allow),
        };
    }

    Some(SegmentVerdict::Ask(format!(
        "{} {} changes installed packages or project state and requires confirmation",
        cmd.name, sub
    )))
}

/// `yarn` and `bun` with no subcommand install dependencies; the rest print help.
fn bare_invocation(cmd: &Command) -> SegmentVerdict {
    if matches!(cmd.name.as_str(), "yarn" | "bun") && cmd.flags().next().is_none() {
        SegmentVerdict::Ask(format!(
            "{} with no subcommand installs dependencies and requires confirmation",
            cmd.name
        ))
    } else {
        SegmentVerdict::Allow
    }
}
