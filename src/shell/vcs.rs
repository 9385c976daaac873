//! Subcommand-aware rules for `git`.
//!
//! Read-only subcommands allow, mutating ones ask. A read-only subcommand
//! carrying a force/hard flag, a `-c` config override, or a subcommand we
//! don't know returns `None`, which leaves the segment unclassified.

use crate::policy::defaults::FORCE_FLAGS;
use crate::policy::types::SegmentVerdict;
use crate::shell::command::Command;

const READ_ONLY: &[&str] = &[
    "status", "diff", "log", "show", "rev-parse", "rev-list", "ls-files", "ls-tree", "ls-remote",
    "blame", "describe", "shortlog", "grep", "fetch", "cat-file", "show-ref", "for-each-ref",
    "merge-base", "name-rev", "whatchanged", "count-objects", "check-ignore", "help", "version",
];

const MUTATING: &[&str] = &[
    "commit", "push", "reset", "merge", "rebase", "cherry-pick", "revert", "checkout", "switch",
    "restore", "add", "rm", "mv", "clean", "pull", "clone", "am", "apply", "init", "submodule",
    "gc", "prune", "bisect", "notes", "filter-branch", "update-ref", "replace",
];

const BRANCH_MUTATING_FLAGS: &[&str] = &[
    "-d", "-D", "--delete", "-m", "-M", "--move", "-c", "-C", "--copy", "-u",
    "--set-upstream-to", "--unset-upstream", "-f", "--force", "--edit-description",
];

const BRANCH_LISTING_FLAGS: &[&str] = &[
    "-l", "--list", "-a", "--all", "-r", "--remotes", "--contains", "--no-contains", "--merged",
    "--no-merged", "--points-at", "--show-current", "-v", "-vv",
];

/// Classify a `git` invocation.
pub fn classify_git(cmd: &Command) -> Option<SegmentVerdict> {
    let (sub, rest) = split_subcommand(cmd)?;
    let Some(sub) = sub else {
        // bare `git` or `git --version`
        return Some(SegmentVerdict::Allow);
    };

    let sub_cmd = Command {
        name: sub.clone(),
        program: sub.clone(),
        args: rest,
        redirects: Vec::new(),
        has_substitution: false,
    };
    let force = sub_cmd.flags().find(|f| FORCE_FLAGS.contains(f));

    if READ_ONLY.contains(&sub.as_str()) {
        return match force {
            Some(_) => None,
            None => Some(SegmentVerdict::Allow),
        };
    }

    if MUTATING.contains(&sub.as_str()) {
        return Some(ask_mutating(&sub, force));
    }

    let operands = sub_cmd.operands();
    let first = operands.first().copied();

    let read_only = match sub.as_str() {
        "branch" => {
            if sub_cmd.has_any_flag(BRANCH_MUTATING_FLAGS) {
                false
            } else {
                operands.is_empty() || sub_cmd.has_any_flag(BRANCH_LISTING_FLAGS)
            }
        }
        "tag" => {
            !sub_cmd.has_any_flag(&["-d", "--delete", "-f", "--force"])
                && (operands.is_empty() || sub_cmd.has_any_flag(&["-l", "--list"]))
        }
        "stash" => matches!(first, Some("list") | Some("show")),
        "remote" => matches!(first, None | Some("show") | Some("get-url")),
        "config" => {
            sub_cmd.has_any_flag(&["--get", "--get-all", "--get-regexp", "--list", "-l"])
                || (operands.len() <= 1
                    && !sub_cmd.has_any_flag(&["--unset", "--unset-all", "--add", "--edit", "-e"]))
        }
        "worktree" => matches!(first, Some("list")),
        "reflog" => !matches!(first, Some("expire") | Some("delete")),
        _ => return None,
    };

    if read_only {
        Some(SegmentVerdict::Allow)
    } else {
        Some(ask_mutating(&sub, force))
    }
}

/// Skip git's global options. Returns `None` when a `-c` override is present.
fn split_subcommand(cmd: &Command) -> Option<(Option<String>, Vec<String>)> {
    let mut iter = cmd.args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config-env" => return None,
            "-C" | "--git-dir" | "--work-tree" | "--namespace" => {
                iter.next();
            }
            a if a.starts_with('-') => {}
            sub => return Some((Some(sub.to_string()), iter.cloned().collect())),
        }
    }
    Some((None, Vec::new()))
}

fn ask_mutating(sub: &str, force: Option<&str>) -> SegmentVerdict {
    if let Some(flag) = force {
        return SegmentVerdict::Ask(format!(
            "git {} {} can discard work or rewrite history and requires confirmation",
            sub, flag
        ));
    }
    if sub == "push" {
        return SegmentVerdict::Ask(
            "git push publishes commits to a remote and requires confirmation".to_string(),
        );
    }
    SegmentVerdict::Ask(format!(
        "git {} modifies repository state and requires confirmation",
        sub
    ))
}
