//! warden-hook: Claude Code PreToolUse hook.
//!
//! Reads one tool-call request from stdin, decides it, and prints the
//! decision envelope to stdout. Prints nothing when warden has no opinion.
//! Always exits 0: a crashing hook would block the agent.
//!
//! Stdin format (from Claude Code):
//! {
//!   "session_id": "...",
//!   "cwd": "/project/path",
//!   "hook_event_name": "PreToolUse",
//!   "tool_name": "Bash",
//!   "tool_input": { "command": "rm -rf /" }
//! }

use std::io::Read;
use std::process;
use tracing_subscriber::EnvFilter;
use warden::policy::{parser, Pipeline};
use warden::protocol::{HookOutput, PRE_TOOL_USE};
use warden::review::REVIEWER_ENV;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("warden=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // The reviewer's own tool calls land here too; stay out of its way.
    if std::env::var(REVIEWER_ENV).map_or(false, |v| v == "1") {
        process::exit(0);
    }

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        tracing::warn!(error = %e, "failed to read stdin");
        process::exit(0);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!(error = %e, "failed to start runtime");
            process::exit(0);
        }
    };

    let pipeline = Pipeline::from_config(parser::load());
    let verdict = runtime.block_on(pipeline.decide(&input));

    // anything other than PreToolUse already fell through
    if let Some(output) = HookOutput::from_verdict(&verdict, PRE_TOOL_USE) {
        match output.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize verdict"),
        }
    }
}
