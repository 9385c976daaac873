//! Core types for the warden decision pipeline.
//!
//! These types define the policy configuration, the per-segment shell
//! classification, and the final verdict handed back to the agent host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Current config file format version.
pub const CONFIG_VERSION: u32 = 1;

/// The loaded policy configuration. Built once per invocation, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    pub version: u32,

    /// Whether inconclusive requests are sent to the advisory reviewer.
    pub review_enabled: bool,

    /// Directories (absolute or `~/`) that file operations may touch
    /// in addition to the scratch root.
    pub allowed_paths: BTreeSet<String>,

    /// Command names treated as always safe, on top of the built-in set.
    pub extra_safe_commands: BTreeSet<String>,

    /// How the advisory reviewer process is launched.
    pub reviewer: ReviewerConfig,

    /// How long a pushback record stays live before it expires.
    pub pushback_ttl_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            review_enabled: true,
            allowed_paths: BTreeSet::new(),
            extra_safe_commands: BTreeSet::new(),
            reviewer: ReviewerConfig::default(),
            pushback_ttl_secs: 600,
        }
    }
}

/// Launch settings for the external advisory reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewerConfig {
    /// Program to run (looked up on PATH).
    pub program: String,

    /// Full argument list. When set, replaces the built-in `claude` arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Hard wall-clock limit for one review.
    pub timeout_secs: u64,

    /// Spend cap passed through to the reviewer CLI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_budget_usd: Option<f64>,
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            args: None,
            model: Some("haiku".to_string()),
            timeout_secs: 30,
            max_budget_usd: None,
        }
    }
}

/// Classification of one shell segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentVerdict {
    Allow,
    Deny(String),
    Ask(String),
    /// No local rule covers this segment.
    Unknown,
}

impl SegmentVerdict {
    /// Aggregation precedence: Deny > Ask > Unknown > Allow.
    pub fn severity(&self) -> u8 {
        match self {
            SegmentVerdict::Allow => 0,
            SegmentVerdict::Unknown => 1,
            SegmentVerdict::Ask(_) => 2,
            SegmentVerdict::Deny(_) => 3,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SegmentVerdict::Deny(r) | SegmentVerdict::Ask(r) => Some(r),
            SegmentVerdict::Allow | SegmentVerdict::Unknown => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SegmentVerdict::Allow => "allow",
            SegmentVerdict::Deny(_) => "deny",
            SegmentVerdict::Ask(_) => "ask",
            SegmentVerdict::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SegmentVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.label(), reason),
            None => write!(f, "{}", self.label()),
        }
    }
}

/// The final, externally observable decision for one request.
///
/// `Deny` and `Ask` always carry a non-empty reason (use the constructors).
/// `FallThrough` means "no opinion" and carries nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Allow {
        /// Where the approval came from (rule name or reviewer's reason).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provenance: Option<String>,
    },
    Deny {
        reason: String,
    },
    Ask {
        reason: String,
    },
    FallThrough,
}

impl Verdict {
    pub fn allow() -> Self {
        Verdict::Allow { provenance: None }
    }

    pub fn allow_because(provenance: impl Into<String>) -> Self {
        let provenance = provenance.into();
        Verdict::Allow {
            provenance: (!provenance.trim().is_empty()).then_some(provenance),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Verdict::Deny {
            reason: non_empty(reason.into(), "Blocked by warden policy"),
        }
    }

    pub fn ask(reason: impl Into<String>) -> Self {
        Verdict::Ask {
            reason: non_empty(reason.into(), "Warden requires confirmation for this action"),
        }
    }

    /// Lowercase kind used on the wire and in the audit log.
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Allow { .. } => "allow",
            Verdict::Deny { .. } => "deny",
            Verdict::Ask { .. } => "ask",
            Verdict::FallThrough => "fall_through",
        }
    }

    /// Reason for Deny/Ask, provenance for Allow, nothing for FallThrough.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Allow { provenance } => provenance.as_deref(),
            Verdict::Deny { reason } | Verdict::Ask { reason } => Some(reason),
            Verdict::FallThrough => None,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Verdict::Deny { .. })
    }

    pub fn is_ask(&self) -> bool {
        matches!(self, Verdict::Ask { .. })
    }

    pub fn is_fall_through(&self) -> bool {
        matches!(self, Verdict::FallThrough)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.kind(), reason),
            None => write!(f, "{}", self.kind()),
        }
    }
}

fn non_empty(reason: String, fallback: &str) -> String {
    if reason.trim().is_empty() {
        fallback.to_string()
    } else {
        reason
    }
}
