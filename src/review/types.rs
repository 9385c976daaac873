use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// The reviewer's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    /// Non-binding rejection: the agent should revise and retry.
    PushBack,
    /// Hand the decision to the human.
    Elevate,
}

impl FromStr for ReviewDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(ReviewDecision::Approve),
            "pushback" | "push_back" | "push-back" => Ok(ReviewDecision::PushBack),
            "elevate" => Ok(ReviewDecision::Elevate),
            other => Err(format!("unknown decision {:?}", other)),
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewDecision::Approve => write!(f, "approve"),
            ReviewDecision::PushBack => write!(f, "pushback"),
            ReviewDecision::Elevate => write!(f, "elevate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReply {
    pub decision: ReviewDecision,
    pub reason: String,
}

impl ReviewReply {
    pub fn new(decision: ReviewDecision, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
        }
    }
}

/// What the reviewer is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    pub text: String,
    /// This exact request was pushed back before.
    pub retry: bool,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("reviewer timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to start reviewer: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("reviewer I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("reviewer exited with {}: {stderr}", exit_label(.code))]
    Exited { code: Option<i32>, stderr: String },

    /// The reviewer ran but reported its own failure (auth, budget, ...).
    #[error("reviewer reported an error: {0}")]
    Reported(String),

    #[error("{0}")]
    Malformed(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "a signal".to_string(),
    }
}
