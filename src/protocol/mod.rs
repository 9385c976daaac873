//! Wire format between the agent host and warden.
//!
//! Inbound is the host's PreToolUse hook payload (with camelCase aliases so
//! a flat `{ "actionKind": .., "filePath": .. }` request also works).
//! Outbound is the `hookSpecificOutput` envelope, or nothing at all for
//! FallThrough.

pub mod request;
pub mod response;

pub use request::{RequestError, ToolCallRequest, PRE_TOOL_USE};
pub use response::HookOutput;
