pub mod logger;
pub mod reader;
pub mod types;

pub use logger::{AuditLogger, DEFAULT_SESSION};
pub use reader::AuditReader;
pub use types::*;
