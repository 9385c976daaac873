//! Built-in tables that ship with warden.
//!
//! Everything here is config-independent: the always-safe command set, the
//! scratch root, and the tool-name groups the orchestrator routes on.

/// Fixed scratch directory. Always authorized, regardless of config.
pub const SCRATCH_ROOT: &str = "/tmp";

/// Shell builtins and read-only text utilities. Always allowed.
pub const SAFE_COMMANDS: &[&str] = &[
    // builtins
    "echo", "printf", "true", "false", "pwd", "cd", "pushd", "popd", "dirs", "type", "which",
    "test", "[", "[[", "sleep", "read", "wait", "export", "unset", "alias", "hash",
    // system info
    "whoami", "id", "uname", "printenv", "df", "du", "uptime", "nproc",
    // read-only text / file inspection
    "ls", "head", "tail", "wc", "cut", "tr", "nl", "column", "fold",
    "rev", "tac", "diff", "cmp", "comm", "basename", "dirname", "realpath", "readlink", "stat",
    "file", "jq", "seq", "expr", "md5sum", "sha1sum", "sha256sum", "shasum",
];

/// Interpreters, test runners, linters and build drivers. Always allowed.
pub const TOOLCHAIN_COMMANDS: &[&str] = &[
    "python", "python3", "node", "deno", "ruby", "rustc", "rustfmt", "pytest", "jest", "vitest",
    "mocha", "tsc", "eslint", "prettier", "ruff", "black", "isort", "mypy", "flake8", "pylint",
    "shellcheck", "golangci-lint", "make", "just", "tox", "nox",
];

/// Commands whose operands are file paths checked against `allowedPaths`.
pub const PLAIN_PATH_COMMANDS: &[&str] = &[
    "cp", "mv", "ln", "mkdir", "touch", "rmdir", "rm", "unlink", "cat", "less", "more", "tee",
];

/// Search tools whose first operand is a pattern, not a path.
pub const SEARCH_COMMANDS: &[&str] = &["grep", "egrep", "fgrep", "rg", "ag"];

/// Commands whose first operand is a mode or owner.
pub const MODE_COMMANDS: &[&str] = &["chmod", "chown", "chgrp"];

/// Readers that can also write a file named by `-o`/`--output` (or, for
/// `uniq`, by the second operand). Only that output is path-checked.
pub const OUTPUT_COMMANDS: &[&str] = &["sort", "tree", "uniq"];

/// System-info commands that change the system when given an operand or a
/// setting flag (`date -s`, `hostname NAME`).
pub const SYSTEM_INFO_COMMANDS: &[&str] = &["date", "hostname"];

/// Remote-repository query CLIs (read-only subcommands only).
pub const REMOTE_QUERY_COMMANDS: &[&str] = &["gh", "glab"];

/// Flags that turn a read-only family subcommand into something unsafe.
pub const FORCE_FLAGS: &[&str] = &[
    "-f",
    "--force",
    "--hard",
    "-D",
    "--force-with-lease",
    "--force-if-includes",
];

/// File-like tools: authorized by path.
pub const FILE_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "NotebookEdit",
    "NotebookRead",
    "Glob",
    "Grep",
    "LS",
];

/// Inherently low-risk tools: read-only queries, user prompts, delegation.
pub const LOW_RISK_TOOLS: &[&str] = &[
    "Task",
    "Agent",
    "TodoWrite",
    "TodoRead",
    "AskUserQuestion",
    "ExitPlanMode",
    "EnterPlanMode",
    "BashOutput",
    "WebSearch",
    "ListMcpResourcesTool",
    "ReadMcpResourceTool",
];

/// Shell-command tools.
pub const SHELL_TOOLS: &[&str] = &["Bash"];

/// Starter config written by `warden init`.
pub const DEFAULT_CONFIG_JSON: &str = r#"{
  "version": 1,
  "reviewEnabled": true,
  "allowedPaths": [],
  "extraSafeCommands": [],
  "reviewer": {
    "program": "claude",
    "model": "haiku",
    "timeoutSecs": 30
  },
  "pushbackTtlSecs": 600
}
"#;

pub fn is_file_tool(kind: &str) -> bool {
    FILE_TOOLS.contains(&kind)
}

pub fn is_low_risk_tool(kind: &str) -> bool {
    LOW_RISK_TOOLS.contains(&kind)
}

pub fn is_shell_tool(kind: &str) -> bool {
    SHELL_TOOLS.contains(&kind)
}
