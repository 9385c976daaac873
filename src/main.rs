//! warden: tool-call authorization for AI coding agents.
//!
//! The hook binary (`warden-hook`) makes the decisions. This CLI sets it up
//! and shows what it decided.
//!
//! Quick start:
//!   warden init                     # write a starter config
//!   warden classify -- rm -rf /tmp  # see how a command is judged
//!   warden log                      # see what the hook decided

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use warden::cli;

/// Filter directive env var shared by both binaries.
const LOG_ENV: &str = "WARDEN_LOG";

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Tool-call authorization hook for AI coding agents",
    long_about = "warden decides whether an AI agent's tool call runs:\n\
                  local rules first, then an advisory reviewer, then you.\n\n\
                  Quick start:\n  \
                  warden init          # write a starter config\n  \
                  warden check         # validate it\n  \
                  warden log           # see what the hook decided"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Validate the config file and suggest fixes
    Check {
        /// Config file to check (default: the one the hook reads)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the local shell rules on a command
    Classify {
        /// Working directory to resolve relative paths against
        #[arg(long)]
        cwd: Option<PathBuf>,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Dry-run the full pipeline on a hook request (FILE or stdin)
    Decide { file: Option<PathBuf> },

    /// See what the hook decided
    Log {
        #[arg(short, long, help = "Session ID to view")]
        session: Option<String>,

        #[arg(short, long, help = "Filter: allow, deny, ask, fall_through")]
        verdict: Option<String>,

        #[arg(short, long, help = "Max entries to show")]
        limit: Option<usize>,

        #[arg(long, help = "Show only the session summary")]
        summary: bool,

        #[arg(long, help = "List all recorded sessions")]
        list: bool,
    },

    /// Inspect or clear outstanding pushbacks
    Pushback {
        #[command(subcommand)]
        action: PushbackAction,
    },
}

#[derive(Subcommand)]
enum PushbackAction {
    /// List records that haven't expired
    List,
    /// Clear one record, or all of them
    Clear { hash: Option<String> },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warden=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => cli::init::run_init(force),
        Commands::Check { config } => cli::check::run_check(config.as_deref()),
        Commands::Classify { cwd, command } => cli::classify::run_classify(&command, cwd),
        Commands::Decide { file } => cli::decide::run_decide(file.as_deref()).await,
        Commands::Log {
            session,
            verdict,
            limit,
            summary,
            list,
        } => {
            if list {
                cli::log::run_log_list()
            } else {
                cli::log::run_log(session.as_deref(), verdict.as_deref(), limit, summary)
            }
        }
        Commands::Pushback { action } => match action {
            PushbackAction::List => cli::pushback::run_pushback_list(),
            PushbackAction::Clear { hash } => cli::pushback::run_pushback_clear(hash.as_deref()),
        },
    };

    if let Err(e) = result {
        eprintln!();
        eprintln!("  {} {}", "✗".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
        std::process::exit(1);
    }
}
