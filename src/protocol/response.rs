use crate::policy::types::Verdict;
use serde::Serialize;

/// The envelope printed to stdout for an explicit decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub permission_decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

impl HookOutput {
    /// `None` for FallThrough: the hook prints nothing.
    pub fn from_verdict(verdict: &Verdict, event_name: &str) -> Option<Self> {
        if verdict.is_fall_through() {
            return None;
        }
        Some(Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event_name.to_string(),
                permission_decision: verdict.kind(),
                permission_decision_reason: verdict.reason().map(str::to_string),
            },
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fall_through_emits_nothing() {
        assert!(HookOutput::from_verdict(&Verdict::FallThrough, "PreToolUse").is_none());
    }

    #[test]
    fn test_ask_envelope() {
        let out = HookOutput::from_verdict(&Verdict::ask("confirm push"), "PreToolUse").unwrap();
        assert_eq!(
            out.to_json().unwrap(),
            r#"{"hookSpecificOutput":{"hookEventName":"PreToolUse","permissionDecision":"ask","permissionDecisionReason":"confirm push"}}"#
        );
    }

    #[test]
    fn test_allow_without_reason_omits_key() {
        let out = HookOutput::from_verdict(&Verdict::allow(), "PreToolUse").unwrap();
        let json = out.to_json().unwrap();
        assert!(json.contains(r#""permissionDecision":"allow""#));
        assert!(!json.contains("permissionDecisionReason"));
    }
}
