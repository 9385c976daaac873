//! Reviewer backed by the `claude` CLI.
//!
//! Runs `claude -p` in structured-output mode with the prompt on stdin. The
//! whole exchange (spawn, write, read, exit) sits under one wall-clock
//! timeout, and the child is killed if the timeout drops it.

use crate::policy::types::ReviewerConfig;
use crate::review::prompt::{REPLY_SCHEMA, SYSTEM_INSTRUCTIONS};
use crate::review::types::{ReviewDecision, ReviewError, ReviewPrompt, ReviewReply};
use crate::review::{Reviewer, REVIEWER_ENV};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const MAX_STDERR_CHARS: usize = 500;

pub struct ClaudeReviewer {
    config: ReviewerConfig,
}

impl ClaudeReviewer {
    pub fn new(config: ReviewerConfig) -> Self {
        Self { config }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Configured args, or the built-in `claude` argument list.
    pub fn args(&self) -> Vec<String> {
        if let Some(args) = &self.config.args {
            return args.clone();
        }

        let mut args: Vec<String> = [
            "-p",
            "--output-format",
            "json",
            "--json-schema",
            REPLY_SCHEMA,
            "--append-system-prompt",
            SYSTEM_INSTRUCTIONS,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(model) = &self.config.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(budget) = self.config.max_budget_usd {
            args.push("--max-budget-usd".to_string());
            args.push(budget.to_string());
        }
        args
    }

    async fn run(&self, prompt: &ReviewPrompt) -> Result<ReviewReply, ReviewError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.args())
            .env_remove("CLAUDECODE")
            .env(REVIEWER_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(ReviewError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(prompt.text.as_bytes()).await {
                Ok(()) => {}
                // The reviewer may answer without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(ReviewError::Io(e)),
            }
        }

        let output = child.wait_with_output().await.map_err(ReviewError::Io)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReviewError::Exited {
                code: output.status.code(),
                stderr: stderr.trim().chars().take(MAX_STDERR_CHARS).collect(),
            });
        }

        parse_reply(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl Reviewer for ClaudeReviewer {
    async fn review(&self, prompt: &ReviewPrompt) -> Result<ReviewReply, ReviewError> {
        let timeout = self.timeout();
        tracing::debug!(program = %self.config.program, ?timeout, retry = prompt.retry, "starting review");
        match tokio::time::timeout(timeout, self.run(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ReviewError::Timeout(timeout)),
        }
    }
}

/// Parse the reviewer's stdout.
///
/// Accepts the CLI envelope's `structured_output`, then its `result` string
/// (code fences tolerated), then a bare `{decision, reason}` object.
pub fn parse_reply(stdout: &str) -> Result<ReviewReply, ReviewError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(ReviewError::Malformed("empty reply".to_string()));
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| ReviewError::Malformed(format!("reply is not JSON: {}", e)))?;

    if value.get("is_error").and_then(Value::as_bool) == Some(true) {
        let message = value
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ReviewError::Reported(message.to_string()));
    }

    if let Some(structured) = value.get("structured_output").filter(|v| v.is_object()) {
        return reply_from_value(structured);
    }

    if let Some(result) = value.get("result").and_then(Value::as_str) {
        let inner: Value = serde_json::from_str(strip_code_fence(result)).map_err(|e| {
            ReviewError::Malformed(format!("result is not a JSON decision: {}", e))
        })?;
        return reply_from_value(&inner);
    }

    reply_from_value(&value)
}

fn reply_from_value(value: &Value) -> Result<ReviewReply, ReviewError> {
    let decision = value
        .get("decision")
        .and_then(Value::as_str)
        .ok_or_else(|| ReviewError::Malformed("missing decision".to_string()))?;
    let decision: ReviewDecision = decision.parse().map_err(ReviewError::Malformed)?;
    let reason = value
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    Ok(ReviewReply { decision, reason })
}

fn strip_code_fence(s: &str) -> &str {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // drop the info string (```json)
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_output() {
        let out = r#"{"type":"result","is_error":false,"result":"","structured_output":{"decision":"approve","reason":"read-only"}}"#;
        assert_eq!(
            parse_reply(out).unwrap(),
            ReviewReply::new(ReviewDecision::Approve, "read-only")
        );
    }

    #[test]
    fn test_parse_result_string_with_fence() {
        let out = serde_json::json!({
            "type": "result",
            "result": "```json\n{\"decision\":\"PushBack\",\"reason\":\"use a temp dir\"}\n```"
        })
        .to_string();
        assert_eq!(
            parse_reply(&out).unwrap(),
            ReviewReply::new(ReviewDecision::PushBack, "use a temp dir")
        );
    }

    #[test]
    fn test_parse_bare_object() {
        let reply = parse_reply(r#"{"decision":"elevate","reason":"prod"}"#).unwrap();
        assert_eq!(reply.decision, ReviewDecision::Elevate);
    }

    #[test]
    fn test_malformed_replies() {
        for out in [
            "",
            "not json",
            r#"{"reason":"no decision"}"#,
            r#"{"decision":"maybe","reason":"x"}"#,
            r#"{"result":"I think it's fine"}"#,
        ] {
            assert!(
                matches!(parse_reply(out), Err(ReviewError::Malformed(_))),
                "{}",
                out
            );
        }
    }

    #[test]
    fn test_reported_error() {
        let out = r#"{"type":"result","is_error":true,"result":"Credit balance is too low"}"#;
        assert!(matches!(parse_reply(out), Err(ReviewError::Reported(_))));
    }

    #[test]
    fn test_default_args() {
        let reviewer = ClaudeReviewer::new(ReviewerConfig {
            max_budget_usd: Some(0.05),
            ..ReviewerConfig::default()
        });
        let args = reviewer.args();
        assert_eq!(args[0], "-p");
        assert!(args.windows(2).any(|w| w == ["--output-format", "json"]));
        assert!(args.windows(2).any(|w| w == ["--model", "haiku"]));
        assert!(args.windows(2).any(|w| w == ["--max-budget-usd", "0.05"]));
        assert!(args.contains(&REPLY_SCHEMA.to_string()));
    }

    #[test]
    fn test_custom_args_replace_defaults() {
        let reviewer = ClaudeReviewer::new(ReviewerConfig {
            program: "sh".into(),
            args: Some(vec!["-c".into(), "cat".into()]),
            ..ReviewerConfig::default()
        });
        assert_eq!(reviewer.args(), vec!["-c", "cat"]);
    }
}
