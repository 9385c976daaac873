//! Types for the warden audit log.
//!
//! One entry per decision, including allows and fall-throughs.

use crate::policy::types::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which stage of the pipeline produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Local shell or path rules.
    Rules,
    /// The advisory reviewer.
    Review,
    /// Built-in low-risk tool list.
    Builtin,
    /// No stage had an opinion.
    None,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Rules => write!(f, "rules"),
            Tier::Review => write!(f, "review"),
            Tier::Builtin => write!(f, "builtin"),
            Tier::None => write!(f, "none"),
        }
    }
}

/// A single entry in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    /// Host session id, or "default"
    pub session_id: String,

    /// Tool name as the host sent it (Bash, Write, ...)
    pub action_kind: String,

    /// File path, command text, or the action kind when there is neither
    pub target: String,

    #[serde(flatten)]
    pub verdict: Verdict,

    pub tier: Tier,

    /// Per-segment classification or the reason review was needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Wall time for the whole decision (microseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_duration_us: Option<u64>,
}

/// Summary statistics for a session's audit log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub total: usize,
    pub allowed: usize,
    pub denied: usize,
    pub asked: usize,
    pub fell_through: usize,
    pub reviewed: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn one_line(&self) -> String {
        format!(
            "{} decisions | {} allowed | {} denied | {} asked | {} no opinion | {} reviewed",
            self.total, self.allowed, self.denied, self.asked, self.fell_through, self.reviewed
        )
    }
}

/// Filter criteria for querying audit logs.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub verdict: Option<VerdictFilter>,
    pub tier: Option<Tier>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictFilter {
    Allow,
    Deny,
    Ask,
    FallThrough,
}

impl VerdictFilter {
    pub fn matches(&self, verdict: &Verdict) -> bool {
        match self {
            VerdictFilter::Allow => verdict.is_allow(),
            VerdictFilter::Deny => verdict.is_deny(),
            VerdictFilter::Ask => verdict.is_ask(),
            VerdictFilter::FallThrough => verdict.is_fall_through(),
        }
    }
}

impl FromStr for VerdictFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" | "allowed" => Ok(VerdictFilter::Allow),
            "deny" | "denied" => Ok(VerdictFilter::Deny),
            "ask" | "asked" => Ok(VerdictFilter::Ask),
            "fall_through" | "fallthrough" | "none" => Ok(VerdictFilter::FallThrough),
            other => Err(format!(
                "unknown verdict '{}' (expected allow, deny, ask or fall_through)",
                other
            )),
        }
    }
}
