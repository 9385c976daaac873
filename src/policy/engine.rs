//! Pipeline orchestrator: turns one raw hook request into one verdict.
//!
//! Routing, in order:
//! 1. Unparseable input, or an event other than PreToolUse: fall through.
//! 2. File tools: allow when the path is authorized, else escalate.
//! 3. Built-in low-risk tools: allow.
//! 4. Shell: classify every segment and aggregate. Unknown escalates.
//! 5. Anything else: review if enabled, else fall through.
//!
//! "Escalate" means the advisory reviewer when review is enabled, and a
//! plain Ask when it isn't. Every verdict from steps 2-5 is audited.

use crate::audit::{AuditEntry, AuditLogger, Tier, DEFAULT_SESSION};
use crate::policy::defaults::{is_file_tool, is_low_risk_tool, is_shell_tool};
use crate::policy::types::*;
use crate::protocol::{ToolCallRequest, PRE_TOOL_USE};
use crate::pushback::FileStore;
use crate::review::prompt::truncate;
use crate::review::{AdvisoryReviewer, ClaudeReviewer};
use crate::shell::{aggregate, classify};
use crate::utils::{paths, state};
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Longest target string written to the audit log.
const MAX_TARGET_CHARS: usize = 500;

pub struct Pipeline {
    config: PolicyConfig,
    reviewer: Option<AdvisoryReviewer>,
    /// `None` disables auditing.
    audit_dir: Option<PathBuf>,
}

/// A verdict plus where it came from, before it is audited.
struct Decision {
    verdict: Verdict,
    tier: Tier,
    detail: Option<String>,
}

impl Decision {
    fn new(verdict: Verdict, tier: Tier) -> Self {
        Self {
            verdict,
            tier,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl Pipeline {
    /// A pipeline with no reviewer and no audit log.
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            reviewer: None,
            audit_dir: None,
        }
    }

    /// The production wiring: `claude` reviewer, file-backed pushback
    /// records and audit logs under the state directory.
    pub fn from_config(config: PolicyConfig) -> Self {
        let reviewer = if config.review_enabled {
            let ttl = Duration::from_secs(config.pushback_ttl_secs);
            match FileStore::new(ttl) {
                Ok(store) => Some(AdvisoryReviewer::new(
                    Box::new(ClaudeReviewer::new(config.reviewer.clone())),
                    Box::new(store),
                )),
                Err(e) => {
                    tracing::warn!(error = format!("{:#}", e), "pushback store unavailable");
                    None
                }
            }
        } else {
            None
        };

        let audit_dir = match state::log_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                tracing::warn!(error = format!("{:#}", e), "audit log disabled");
                None
            }
        };

        Self {
            config,
            reviewer,
            audit_dir,
        }
    }

    pub fn with_reviewer(mut self, reviewer: AdvisoryReviewer) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide a raw hook message. Never fails.
    pub async fn decide(&self, raw: &str) -> Verdict {
        let request = match ToolCallRequest::parse(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable request, falling through");
                return Verdict::FallThrough;
            }
        };

        if request.event_name != PRE_TOOL_USE {
            tracing::debug!(event = %request.event_name, "not a PreToolUse event, falling through");
            return Verdict::FallThrough;
        }

        self.decide_request(&request).await
    }

    /// Decide an already-parsed request and audit the result.
    pub async fn decide_request(&self, request: &ToolCallRequest) -> Verdict {
        let start = Instant::now();
        let decision = self.evaluate(request).await;
        let elapsed = start.elapsed();

        tracing::info!(
            tool = %request.action_kind,
            verdict = decision.verdict.kind(),
            tier = %decision.tier,
            "decided"
        );

        self.audit(request, &decision, elapsed);
        decision.verdict
    }

    async fn evaluate(&self, request: &ToolCallRequest) -> Decision {
        let kind = request.action_kind.as_str();

        if is_file_tool(kind) {
            return self.evaluate_file(request).await;
        }

        if is_low_risk_tool(kind) {
            return Decision::new(Verdict::allow_because("built-in low-risk tool"), Tier::Builtin);
        }

        if is_shell_tool(kind) {
            return self.evaluate_shell(request).await;
        }

        if self.config.review_enabled {
            let context = format!("{} is not covered by any local rule", kind);
            return self.escalate(request, context).await;
        }

        Decision::new(Verdict::FallThrough, Tier::None)
    }

    async fn evaluate_file(&self, request: &ToolCallRequest) -> Decision {
        let working_dir = request.working_dir.to_string_lossy();
        let path = request.file_path.as_deref().unwrap_or(&*working_dir);

        if paths::is_authorized(path, &request.working_dir, &self.config) {
            return Decision::new(
                Verdict::allow_because("path is inside an authorized directory"),
                Tier::Rules,
            );
        }

        let context = format!(
            "{} targets {}, which is outside the authorized directories",
            request.action_kind, path
        );
        self.escalate(request, context).await
    }

    async fn evaluate_shell(&self, request: &ToolCallRequest) -> Decision {
        let command = request.command_text.as_deref().unwrap_or_default();
        let segments = classify(command, &request.working_dir, &self.config);
        let detail = segments
            .iter()
            .map(SegmentVerdict::label)
            .collect::<Vec<_>>()
            .join(",");

        let decision = match aggregate(&segments) {
            SegmentVerdict::Allow => Decision::new(
                Verdict::allow_because("every command segment matched a local rule"),
                Tier::Rules,
            ),
            SegmentVerdict::Deny(reason) => Decision::new(Verdict::deny(reason), Tier::Rules),
            SegmentVerdict::Ask(reason) => Decision::new(Verdict::ask(reason), Tier::Rules),
            SegmentVerdict::Unknown => {
                let context = if command.trim().is_empty() {
                    "the shell command is empty".to_string()
                } else {
                    "local rules could not classify every part of this shell command".to_string()
                };
                self.escalate(request, context).await
            }
        };

        if decision.detail.is_some() {
            decision
        } else {
            decision.with_detail(detail)
        }
    }

    /// Hand an unresolved request to the reviewer, or to the human.
    async fn escalate(&self, request: &ToolCallRequest, context: String) -> Decision {
        if !self.config.review_enabled {
            return Decision::new(
                Verdict::ask(format!("{}; advisory review is disabled", context)),
                Tier::Rules,
            )
            .with_detail(context);
        }

        match &self.reviewer {
            Some(reviewer) => {
                let verdict = reviewer.review(request, &context).await;
                Decision::new(verdict, Tier::Review).with_detail(context)
            }
            None => Decision::new(
                Verdict::ask(format!("Advisory review unavailable; {}", context)),
                Tier::Review,
            )
            .with_detail(context),
        }
    }

    /// Best-effort: a failure here never changes the verdict.
    fn audit(&self, request: &ToolCallRequest, decision: &Decision, elapsed: Duration) {
        let Some(dir) = &self.audit_dir else {
            return;
        };
        let session = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION);

        let entry = AuditEntry {
            timestamp: Utc::now(),
            session_id: session.to_string(),
            action_kind: request.action_kind.clone(),
            target: truncate(&request.target(), MAX_TARGET_CHARS),
            verdict: decision.verdict.clone(),
            tier: decision.tier,
            detail: decision.detail.clone(),
            eval_duration_us: Some(elapsed.as_micros() as u64),
        };

        if let Err(e) = AuditLogger::in_dir(dir, session).and_then(|mut log| log.record(&entry)) {
            tracing::warn!(error = format!("{:#}", e), "failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditReader;
    use tempfile::TempDir;

    fn offline() -> Pipeline {
        Pipeline::new(PolicyConfig {
            review_enabled: false,
            ..PolicyConfig::default()
        })
    }

    fn bash(command: &str) -> String {
        serde_json::json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "cwd": "/home/dev/project",
            "tool_input": { "command": command }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_garbage_falls_through() {
        let pipeline = offline();
        assert_eq!(pipeline.decide("").await, Verdict::FallThrough);
        assert_eq!(pipeline.decide("not json").await, Verdict::FallThrough);
        assert_eq!(pipeline.decide("[1,2]").await, Verdict::FallThrough);
    }

    #[tokio::test]
    async fn test_other_events_fall_through() {
        let raw = r#"{"hook_event_name":"PostToolUse","tool_name":"Bash","tool_input":{"command":"ls"}}"#;
        assert_eq!(offline().decide(raw).await, Verdict::FallThrough);
    }

    #[tokio::test]
    async fn test_shell_routing() {
        let pipeline = offline();
        assert!(pipeline.decide(&bash("ls -la")).await.is_allow());
        assert!(pipeline.decide(&bash("git push origin main")).await.is_ask());
        assert!(pipeline.decide(&bash("rm -rf /home/dev")).await.is_deny());
        // unknown with review disabled escalates to the human
        assert!(pipeline.decide(&bash("ssh prod uptime")).await.is_ask());
    }

    #[tokio::test]
    async fn test_file_routing() {
        let pipeline = offline();
        let inside = r#"{"tool_name":"Read","cwd":"/w","tool_input":{"file_path":"/tmp/notes.txt"}}"#;
        assert!(pipeline.decide(inside).await.is_allow());

        let outside = r#"{"tool_name":"Write","cwd":"/w","tool_input":{"file_path":"/etc/hosts"}}"#;
        let verdict = pipeline.decide(outside).await;
        assert!(verdict.is_ask());
        assert!(verdict.reason().unwrap().contains("/etc/hosts"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let raw = r#"{"tool_name":"mcp__db__query","cwd":"/w","tool_input":{}}"#;
        assert_eq!(offline().decide(raw).await, Verdict::FallThrough);

        // review on, but no reviewer could be wired
        let pipeline = Pipeline::new(PolicyConfig::default());
        let verdict = pipeline.decide(raw).await;
        assert!(verdict.is_ask());
        assert!(verdict.reason().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_low_risk_tools_allowed() {
        let raw = r#"{"tool_name":"TodoWrite","cwd":"/w","tool_input":{"todos":[]}}"#;
        let verdict = offline().decide(raw).await;
        assert!(verdict.is_allow());
        assert_eq!(verdict.reason(), Some("built-in low-risk tool"));
    }

    #[tokio::test]
    async fn test_decisions_are_audited() {
        let tmp = TempDir::new().unwrap();
        let pipeline = offline().with_audit_dir(tmp.path());

        let raw = serde_json::json!({
            "session_id": "abc",
            "tool_name": "Bash",
            "cwd": "/w",
            "tool_input": { "command": "ls && git push" }
        })
        .to_string();
        pipeline.decide(&raw).await;
        pipeline.decide("garbage").await;

        let entries = AuditReader::with_dir(tmp.path()).read_session("abc").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].verdict.is_ask());
        assert_eq!(entries[0].tier, Tier::Rules);
        assert_eq!(entries[0].detail.as_deref(), Some("allow,ask"));
        assert_eq!(entries[0].target, "ls && git push");
    }

    #[tokio::test]
    async fn test_audit_failure_keeps_verdict() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("logs");
        std::fs::write(&blocker, "not a directory").unwrap();
        let pipeline = offline().with_audit_dir(&blocker);
        assert!(pipeline.decide(&bash("rm -rf /home/dev")).await.is_deny());
    }
}
