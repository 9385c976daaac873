//! The pushback state machine.
//!
//! ```text
//! Invoked ─┬─ Approve ─────────────────► Allow   (record cleared)
//!          ├─ Elevate ─────────────────► Ask     (record cleared)
//!          ├─ PushBack, first time ────► Deny    (record created)
//!          ├─ PushBack, retry ─────────► Ask     (record cleared)
//!          ├─ timed out ───────────────► Ask
//!          └─ failed / malformed ──────► Ask
//! ```
//!
//! A request can be pushed back at most once before it reaches the human,
//! so an agent retrying the identical call always terminates.

use crate::protocol::ToolCallRequest;
use crate::pushback::PushbackStore;
use crate::review::prompt::{build_prompt, MAX_EXCERPT_CHARS};
use crate::review::transcript::recent_excerpt;
use crate::review::types::{ReviewDecision, ReviewError, ReviewReply};
use crate::review::Reviewer;
use crate::policy::types::Verdict;

pub struct AdvisoryReviewer {
    reviewer: Box<dyn Reviewer>,
    store: Box<dyn PushbackStore>,
}

impl AdvisoryReviewer {
    pub fn new(reviewer: Box<dyn Reviewer>, store: Box<dyn PushbackStore>) -> Self {
        Self { reviewer, store }
    }

    pub fn store(&self) -> &dyn PushbackStore {
        self.store.as_ref()
    }

    /// Review `request`. `context` says why local rules were inconclusive.
    pub async fn review(&self, request: &ToolCallRequest, context: &str) -> Verdict {
        let hash = request.hash();
        let retry = match self.store.contains(&hash) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "pushback store unreadable, treating as first attempt");
                false
            }
        };

        let excerpt = request
            .conversation_ref
            .as_deref()
            .and_then(|path| recent_excerpt(path, MAX_EXCERPT_CHARS));
        let prompt = build_prompt(request, context, excerpt.as_deref(), retry);

        let outcome = self.reviewer.review(&prompt).await;
        self.resolve(&hash, retry, outcome)
    }

    fn resolve(
        &self,
        hash: &str,
        retry: bool,
        outcome: Result<ReviewReply, ReviewError>,
    ) -> Verdict {
        let reply = match outcome {
            Ok(reply) => reply,
            Err(ReviewError::Timeout(after)) => {
                tracing::warn!(?after, "advisory review timed out");
                return Verdict::ask(format!(
                    "Advisory review timed out after {}s; confirm manually",
                    after.as_secs()
                ));
            }
            Err(ReviewError::Malformed(detail)) => {
                tracing::warn!(%detail, "advisory reviewer sent a malformed reply");
                return Verdict::ask(format!(
                    "Advisory reviewer sent a malformed reply ({}); confirm manually",
                    detail
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "advisory review unavailable");
                return Verdict::ask(format!("Advisory review unavailable ({}); confirm manually", e));
            }
        };

        tracing::info!(decision = %reply.decision, retry, "advisory review finished");
        let reason = reply.reason;

        match reply.decision {
            ReviewDecision::Approve => {
                self.clear(hash);
                if reason.is_empty() {
                    Verdict::allow_because("approved by advisory review")
                } else {
                    Verdict::allow_because(format!("advisory review: {}", reason))
                }
            }
            ReviewDecision::Elevate => {
                self.clear(hash);
                Verdict::ask(or_default(reason, "Advisory reviewer escalated this action"))
            }
            ReviewDecision::PushBack if retry => {
                self.clear(hash);
                Verdict::ask(format!(
                    "Advisory reviewer pushed back on a retried request; escalating: {}",
                    or_default(reason, "no reason given")
                ))
            }
            ReviewDecision::PushBack => match self.store.record(hash) {
                Ok(true) => Verdict::deny(format!(
                    "Advisory reviewer pushed back: {}",
                    or_default(reason, "revise the approach and retry")
                )),
                Ok(false) => {
                    // An identical request recorded first: this one is the retry.
                    self.clear(hash);
                    Verdict::ask(format!(
                        "Advisory reviewer pushed back on a concurrent duplicate; escalating: {}",
                        or_default(reason, "no reason given")
                    ))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not record pushback, escalating");
                    Verdict::ask(format!(
                        "Advisory reviewer pushed back, but the retry state could not be saved: {}",
                        or_default(reason, "no reason given")
                    ))
                }
            },
        }
    }

    fn clear(&self, hash: &str) {
        if let Err(e) = self.store.clear(hash) {
            tracing::warn!(error = %e, "could not clear pushback record");
        }
    }
}

fn or_default(reason: String, fallback: &str) -> String {
    if reason.trim().is_empty() {
        fallback.to_string()
    } else {
        reason
    }
}
