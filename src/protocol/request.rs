use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;

/// The only hook event warden renders opinions on.
pub const PRE_TOOL_USE: &str = "PreToolUse";

/// Why an inbound message produced no request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request is not a JSON object")]
    NotObject,

    #[error("request has no action kind")]
    MissingActionKind,
}

/// Envelope fields. Everything else at the top level is treated as payload.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(alias = "actionKind")]
    tool_name: Option<String>,
    #[serde(alias = "workingDir")]
    cwd: Option<String>,
    #[serde(alias = "toolInput")]
    tool_input: Option<Value>,
    #[serde(alias = "conversationRef")]
    transcript_path: Option<String>,
    #[serde(alias = "sessionId")]
    session_id: Option<String>,
    #[serde(alias = "hookEventName")]
    hook_event_name: Option<String>,
}

const ENVELOPE_KEYS: &[&str] = &[
    "tool_name", "actionKind", "cwd", "workingDir", "tool_input", "toolInput", "transcript_path",
    "conversationRef", "session_id", "sessionId", "hook_event_name", "hookEventName",
    "permission_mode", "permissionMode",
];

const FILE_PATH_KEYS: &[&str] = &["file_path", "filePath", "path", "notebook_path", "notebookPath"];
const COMMAND_KEYS: &[&str] = &["command", "commandText"];
const PURPOSE_KEYS: &[&str] = &["description", "statedPurpose"];

/// One tool call the agent wants to make. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub action_kind: String,
    pub working_dir: PathBuf,
    pub file_path: Option<String>,
    pub command_text: Option<String>,
    pub stated_purpose: Option<String>,
    /// Transcript file with the recent conversation.
    pub conversation_ref: Option<PathBuf>,
    pub session_id: Option<String>,
    pub event_name: String,
    /// The tool's input object, used for review and hashing.
    pub payload: Value,
}

impl ToolCallRequest {
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(top) = value else {
            return Err(RequestError::NotObject);
        };
        let envelope: Envelope = serde_json::from_value(Value::Object(top.clone()))?;

        let action_kind = envelope
            .tool_name
            .filter(|k| !k.trim().is_empty())
            .ok_or(RequestError::MissingActionKind)?;

        let payload = match envelope.tool_input {
            Some(Value::Object(input)) => Value::Object(input),
            _ => Value::Object(
                top.iter()
                    .filter(|(k, _)| !ENVELOPE_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        };

        let working_dir = envelope
            .cwd
            .filter(|c| !c.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        let file_path = lookup(&payload, &top, FILE_PATH_KEYS);
        let command_text = lookup(&payload, &top, COMMAND_KEYS);
        let stated_purpose = lookup(&payload, &top, PURPOSE_KEYS);

        Ok(Self {
            action_kind,
            working_dir,
            file_path,
            command_text,
            stated_purpose,
            conversation_ref: envelope
                .transcript_path
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            session_id: envelope.session_id.filter(|s| !s.is_empty()),
            event_name: envelope
                .hook_event_name
                .unwrap_or_else(|| PRE_TOOL_USE.to_string()),
            payload,
        })
    }

    /// Hex SHA-256 over action kind, working dir and the canonical payload.
    ///
    /// `serde_json::Value` objects keep keys sorted, so two requests with the
    /// same fields in a different order hash the same.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.action_kind.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.working_dir.to_string_lossy().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.payload.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Short description of what is being acted on, for the audit log.
    pub fn target(&self) -> String {
        self.file_path
            .clone()
            .or_else(|| self.command_text.clone())
            .unwrap_or_else(|| self.action_kind.clone())
    }
}

/// First string value under any of `keys`, in the payload then at top level.
fn lookup(payload: &Value, top: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let from = |obj: Option<&Map<String, Value>>| {
        let obj = obj?;
        keys.iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| v.as_str())
            .map(str::to_string)
    };
    from(payload.as_object()).or_else(|| from(Some(top)))
}
