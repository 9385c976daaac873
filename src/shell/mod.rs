//! Tier 1: shell command segmentation, classification and aggregation.

pub mod aggregate;
pub mod classify;
pub mod command;
pub mod family;
pub mod packages;
pub mod segment;
pub mod vcs;

pub use aggregate::aggregate;
pub use classify::{classify, classify_segment};
pub use family::CommandFamily;
