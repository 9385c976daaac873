//! Tier 2: the advisory reviewer.
//!
//! Requests the local rules could not settle are described to an external
//! reviewer process, which answers approve, pushback or elevate. The
//! [`AdvisoryReviewer`] turns that answer into a [`Verdict`], consulting the
//! pushback store so the same request is never pushed back twice in a row.
//!
//! [`Verdict`]: crate::policy::types::Verdict

pub mod claude;
pub mod client;
pub mod prompt;
pub mod transcript;
pub mod types;

pub use claude::ClaudeReviewer;
pub use client::AdvisoryReviewer;
pub use types::{ReviewDecision, ReviewError, ReviewPrompt, ReviewReply};

use async_trait::async_trait;

/// Set in the reviewer's environment. A hook invoked with it set falls
/// through, so the reviewer's own tool calls never recurse into review.
pub const REVIEWER_ENV: &str = "WARDEN_REVIEWER";

/// Something that can review a prompt and return a decision.
/// The production implementation shells out to the `claude` CLI; tests use
/// scripted reviewers.
#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, prompt: &ReviewPrompt) -> Result<ReviewReply, ReviewError>;
}
