//! warden: tool-call authorization for AI coding agents.
//!
//! Every tool call an agent wants to make passes through three tiers:
//! local rules ([`shell`], [`utils::paths`]), an advisory reviewer
//! ([`review`]) for whatever the rules can't settle, and finally the human.
//! [`policy::Pipeline`] wires the tiers together. The binaries are in
//! `main.rs` (operator CLI) and `hook/main.rs` (the PreToolUse hook).

pub mod audit;
pub mod cli;
pub mod policy;
pub mod protocol;
pub mod pushback;
pub mod review;
pub mod shell;
pub mod utils;
