//! Impact-severity aggregation over audit violations.

use serde::{Deserialize, Serialize};

use crate::types::AuditViolation;

/// Violation counts for the four named severities.
///
/// Violations with a missing or unrecognized impact contribute to the
/// response's `totalIssues` only, so the sum of these counters never
/// exceeds the violation count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactCounts {
    pub critical: u64,
    pub serious: u64,
    pub moderate: u64,
    pub minor: u64,
}

impl ImpactCounts {
    pub fn total(&self) -> u64 {
        self.critical + self.serious + self.moderate + self.minor
    }
}

/// Single pass over the violations sequence; pure.
pub fn count_by_impact(violations: &[AuditViolation]) -> ImpactCounts {
    let mut counts = ImpactCounts::default();
    for violation in violations {
        match violation.impact.as_deref() {
            Some("critical") => counts.critical += 1,
            Some("serious") => counts.serious += 1,
            Some("moderate") => counts.moderate += 1,
            Some("minor") => counts.minor += 1,
            _ => {}
        }
    }
    counts
}
