//! Prompt construction for the advisory reviewer.
//!
//! The prompt is bounded: the tool input is capped at
//! [`MAX_PAYLOAD_CHARS`], the conversation excerpt at [`MAX_EXCERPT_CHARS`],
//! and the stated purpose and review context at their own caps, so a huge
//! file write or description can't blow up the review.

use crate::protocol::ToolCallRequest;
use crate::review::types::ReviewPrompt;

pub const MAX_PAYLOAD_CHARS: usize = 4000;
pub const MAX_EXCERPT_CHARS: usize = 2000;
pub const MAX_PURPOSE_CHARS: usize = 500;
pub const MAX_CONTEXT_CHARS: usize = 1000;

/// Appended to the reviewer's system prompt.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You review tool calls made by an autonomous coding agent before they run. \
Local safety rules could not settle this one. Answer with exactly one decision:
- approve: the action is safe and consistent with the task.
- pushback: the action is risky or off-task, but the agent could reach its goal \
another way. Explain what to do instead; the agent will see your reason and retry.
- elevate: only a human can decide (irreversible, touches credentials or \
production, or the intent is unclear).
Prefer pushback over elevate when a safer alternative exists. \
Never approve destructive actions outside the project or the temp directory.";

/// JSON schema the reviewer's reply must satisfy.
pub const REPLY_SCHEMA: &str = r#"{"type":"object","properties":{"decision":{"type":"string","enum":["approve","pushback","elevate"]},"reason":{"type":"string"}},"required":["decision","reason"],"additionalProperties":false}"#;

/// Build the prompt for `request`.
///
/// `context` says why local rules were inconclusive. `excerpt` is the tail of
/// the conversation, if one could be read.
pub fn build_prompt(
    request: &ToolCallRequest,
    context: &str,
    excerpt: Option<&str>,
    retry: bool,
) -> ReviewPrompt {
    let payload = serde_json::to_string_pretty(&request.payload)
        .unwrap_or_else(|_| request.payload.to_string());

    let mut text = String::new();
    text.push_str("A coding agent wants to make this tool call.\n\n");
    text.push_str(&format!("Action: {}\n", request.action_kind));
    text.push_str(&format!(
        "Working directory: {}\n",
        request.working_dir.display()
    ));
    if let Some(purpose) = request.stated_purpose.as_deref().filter(|p| !p.trim().is_empty()) {
        text.push_str(&format!(
            "Stated purpose: {}\n",
            truncate(purpose, MAX_PURPOSE_CHARS)
        ));
    }
    text.push_str(&format!(
        "Why it needs review: {}\n",
        truncate(context, MAX_CONTEXT_CHARS)
    ));
    text.push_str("\nInput:\n");
    text.push_str(&truncate(&payload, MAX_PAYLOAD_CHARS));
    text.push('\n');

    if let Some(excerpt) = excerpt.filter(|e| !e.trim().is_empty()) {
        text.push_str("\nRecent conversation:\n");
        text.push_str(&truncate_start(excerpt, MAX_EXCERPT_CHARS));
        text.push('\n');
    }

    if retry {
        text.push_str(
            "\nThis exact request was already pushed back once. A second pushback is not \
             possible: approve it or elevate it to the human.\n",
        );
    }

    ReviewPrompt { text, retry }
}

/// Keep the first `max` chars, marking the cut.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\n... [truncated]", &s[..idx]),
        None => s.to_string(),
    }
}

/// Keep the last `max` chars, marking the cut.
pub fn truncate_start(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    match s.char_indices().nth(count - max) {
        Some((idx, _)) => format!("[earlier conversation omitted] ...\n{}", &s[idx..]),
        None => s.to_string(),
    }
}
