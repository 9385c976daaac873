//! Drives `ClaudeReviewer` against `sh -c` scripts standing in for the CLI.

use std::time::{Duration, Instant};
use warden::policy::ReviewerConfig;
use warden::review::{ClaudeReviewer, ReviewDecision, ReviewError, ReviewPrompt, Reviewer};

fn fake(script: &str, timeout_secs: u64) -> ClaudeReviewer {
    ClaudeReviewer::new(ReviewerConfig {
        program: "sh".to_string(),
        args: Some(vec!["-c".to_string(), script.to_string()]),
        model: None,
        timeout_secs,
        max_budget_usd: None,
    })
}

fn prompt() -> ReviewPrompt {
    ReviewPrompt {
        text: "Tool: Bash\nCommand: curl http://x\n".to_string(),
        retry: false,
    }
}

#[tokio::test]
async fn test_structured_approve() {
    let reviewer = fake(
        r#"cat >/dev/null; echo '{"type":"result","is_error":false,"structured_output":{"decision":"Approve","reason":"read-only fetch"}}'"#,
        10,
    );
    let reply = reviewer.review(&prompt()).await.unwrap();
    assert_eq!(reply.decision, ReviewDecision::Approve);
    assert_eq!(reply.reason, "read-only fetch");
}

#[tokio::test]
async fn test_bare_pushback_without_reading_stdin() {
    let reviewer = fake(r#"echo '{"decision":"pushback","reason":"use the SDK"}'"#, 10);
    let reply = reviewer.review(&prompt()).await.unwrap();
    assert_eq!(reply.decision, ReviewDecision::PushBack);
}

#[tokio::test]
async fn test_prompt_arrives_on_stdin() {
    let reviewer = fake(
        r#"if grep -q 'curl http://x'; then echo '{"decision":"elevate","reason":"saw it"}'; else echo '{}'; fi"#,
        10,
    );
    let reply = reviewer.review(&prompt()).await.unwrap();
    assert_eq!(reply.decision, ReviewDecision::Elevate);
}

#[tokio::test]
async fn test_reviewer_env_is_set() {
    let reviewer = fake(
        r#"cat >/dev/null; if [ "$WARDEN_REVIEWER" = 1 ] && [ -z "$CLAUDECODE" ]; then echo '{"decision":"approve","reason":"env ok"}'; fi"#,
        10,
    );
    let reply = reviewer.review(&prompt()).await.unwrap();
    assert_eq!(reply.reason, "env ok");
}

#[tokio::test]
async fn test_timeout() {
    let reviewer = fake("sleep 5", 1);
    let start = Instant::now();
    let err = reviewer.review(&prompt()).await.unwrap_err();
    assert!(matches!(err, ReviewError::Timeout(d) if d == Duration::from_secs(1)));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_malformed_reply() {
    let reviewer = fake("cat >/dev/null; echo 'sure, looks fine'", 10);
    assert!(matches!(
        reviewer.review(&prompt()).await,
        Err(ReviewError::Malformed(_))
    ));

    let reviewer = fake(r#"echo '{"decision":"maybe","reason":"?"}'"#, 10);
    assert!(matches!(
        reviewer.review(&prompt()).await,
        Err(ReviewError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_nonzero_exit() {
    let reviewer = fake("echo 'not logged in' >&2; exit 3", 10);
    match reviewer.review(&prompt()).await {
        Err(ReviewError::Exited { code, stderr }) => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "not logged in");
        }
        other => panic!("expected Exited, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_program() {
    let reviewer = ClaudeReviewer::new(ReviewerConfig {
        program: "warden-no-such-reviewer-binary".to_string(),
        ..ReviewerConfig::default()
    });
    assert!(matches!(
        reviewer.review(&prompt()).await,
        Err(ReviewError::Spawn(_))
    ));
}
