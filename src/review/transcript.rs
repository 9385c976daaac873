//! Recent-conversation excerpt from the host's transcript file.
//!
//! The transcript is JSONL; each line is an event. Only user and assistant
//! text turns are kept, and only the last [`TAIL_BYTES`] of the file are
//! read. Anything unreadable yields `None` and the review goes ahead without
//! an excerpt.

use serde_json::Value;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// How much of the end of the transcript is read.
pub const TAIL_BYTES: u64 = 256 * 1024;

/// Last text turns of the conversation, newest last, within `max_chars`.
pub fn recent_excerpt(path: &Path, max_chars: usize) -> Option<String> {
    let content = match read_tail(path, TAIL_BYTES) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "transcript unreadable");
            return None;
        }
    };

    let mut turns: Vec<String> = Vec::new();
    let mut used = 0;
    for line in content.lines().rev() {
        let Some(turn) = parse_turn(line) else {
            continue;
        };
        used += turn.chars().count() + 1;
        turns.push(turn);
        if used >= max_chars {
            break;
        }
    }

    if turns.is_empty() {
        return None;
    }
    turns.reverse();
    Some(turns.join("\n"))
}

/// The last `max_bytes` of `path`, starting at a line boundary.
fn read_tail(path: &Path, max_bytes: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))?;

    let mut bytes = Vec::new();
    file.take(max_bytes).read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);

    if start == 0 {
        return Ok(text.into_owned());
    }
    // the first line is partial
    Ok(match text.split_once('\n') {
        Some((_, rest)) => rest.to_string(),
        None => String::new(),
    })
}

fn parse_turn(line: &str) -> Option<String> {
    let event: Value = serde_json::from_str(line.trim()).ok()?;
    let role = event.get("type").and_then(Value::as_str)?;
    if role != "user" && role != "assistant" {
        return None;
    }

    let content = event.get("message").and_then(|m| m.get("content"))?;
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(format!("{}: {}", role, text))
}
