//! Worst-of aggregation across segments.

use crate::policy::types::SegmentVerdict;

/// Combine segment verdicts. Precedence: `Deny > Ask > Unknown > Allow`.
///
/// Every segment is inspected. When several segments share the winning
/// kind, their reasons are joined so the caller sees all of them. An empty
/// list is `Unknown`: no command was found, so nothing was proven safe.
pub fn aggregate(verdicts: &[SegmentVerdict]) -> SegmentVerdict {
    let Some(worst) = verdicts.iter().map(SegmentVerdict::severity).max() else {
        return SegmentVerdict::Unknown;
    };

    let mut reasons: Vec<&str> = Vec::new();
    for reason in verdicts
        .iter()
        .filter(|v| v.severity() == worst)
        .filter_map(SegmentVerdict::reason)
    {
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }
    let joined = reasons.join("; ");

    match verdicts.iter().find(|v| v.severity() == worst) {
        Some(SegmentVerdict::Deny(_)) => SegmentVerdict::Deny(joined),
        Some(SegmentVerdict::Ask(_)) => SegmentVerdict::Ask(joined),
        Some(SegmentVerdict::Unknown) => SegmentVerdict::Unknown,
        _ => SegmentVerdict::Allow,
    }
}
