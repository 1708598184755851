//! Recurrence-based promotion
//!
//! Knowledge that keeps recurring is assumed validated by repetition: once
//! an Orb's recurrence count reaches the configured threshold it is promoted
//! straight to approved, bypassing the human gate. Rejected Orbs never
//! promote, however often their input recurs.

use crate::artifact::{ArtifactStatus, Orb};

/// Outcome of evaluating an Orb against the promotion threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Transition the Orb (and its Rune) directly to approved
    Promote,
    /// Forward to the approval gate unless an open request already exists
    Hold,
}

/// Evaluates recurrence counters against the promotion threshold
pub struct RecurrenceTracker {
    threshold: u32,
}

impl RecurrenceTracker {
    /// Create a tracker with the configured promotion threshold
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Promote iff the recurrence count has reached the threshold and the
    /// Orb was not rejected. Total and deterministic.
    pub fn evaluate(&self, orb: &Orb) -> Decision {
        if orb.status == ArtifactStatus::Rejected {
            return Decision::Hold;
        }
        if orb.recurrence_count >= self.threshold {
            Decision::Promote
        } else {
            Decision::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Category, Fingerprint};
    use crate::classify::Domain;
    use chrono::Utc;
    use uuid::Uuid;

    fn orb(recurrence_count: u32, status: ArtifactStatus) -> Orb {
        Orb {
            id: Uuid::new_v4(),
            domain: Domain::General,
            title: "t".to_string(),
            description: "d".to_string(),
            category: Category::Procedure,
            fingerprint: Fingerprint::compute(Domain::General, "t"),
            recurrence_count,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_below_threshold_holds() {
        let tracker = RecurrenceTracker::new(3);
        assert_eq!(
            tracker.evaluate(&orb(2, ArtifactStatus::Pending)),
            Decision::Hold
        );
    }

    #[test]
    fn test_at_threshold_promotes() {
        let tracker = RecurrenceTracker::new(3);
        assert_eq!(
            tracker.evaluate(&orb(3, ArtifactStatus::Pending)),
            Decision::Promote
        );
        assert_eq!(
            tracker.evaluate(&orb(7, ArtifactStatus::Pending)),
            Decision::Promote
        );
    }

    #[test]
    fn test_rejected_never_promotes() {
        let tracker = RecurrenceTracker::new(3);
        assert_eq!(
            tracker.evaluate(&orb(100, ArtifactStatus::Rejected)),
            Decision::Hold
        );
    }

    #[test]
    fn test_approved_stays_promoted() {
        // Re-evaluating an already approved Orb keeps promoting; the store's
        // same-status transition is a no-op, so status never reverts
        let tracker = RecurrenceTracker::new(3);
        assert_eq!(
            tracker.evaluate(&orb(5, ArtifactStatus::Approved)),
            Decision::Promote
        );
    }
}
