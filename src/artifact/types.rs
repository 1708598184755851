//! Orb and Rune data types

use super::fingerprint::Fingerprint;
use crate::classify::Domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Script language for generated Rune skeletons
pub const SCRIPT_LANGUAGE_SHELL: &str = "shell";

/// Lifecycle status of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Awaiting recurrence promotion or human approval
    Pending,
    /// Part of the domain's capability set
    Approved,
    /// Rejected by a reviewer; retained so identical candidates are
    /// recognized as known-rejected
    Rejected,
}

impl std::fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Knowledge category, derived from the input type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Procedure,
    Faq,
    Reference,
    Observation,
    Remediation,
    Runbook,
    Conversation,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Procedure => write!(f, "procedure"),
            Self::Faq => write!(f, "faq"),
            Self::Reference => write!(f, "reference"),
            Self::Observation => write!(f, "observation"),
            Self::Remediation => write!(f, "remediation"),
            Self::Runbook => write!(f, "runbook"),
            Self::Conversation => write!(f, "conversation"),
        }
    }
}

/// A descriptive knowledge artifact. The `id` is stable once assigned and is
/// never regenerated on merge; `fingerprint` is unique within the domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    pub id: Uuid,
    pub domain: Domain,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub fingerprint: Fingerprint,
    /// Times equivalent input has been observed. Monotonically
    /// non-decreasing, incremented by exactly 1 per deduplicated match.
    pub recurrence_count: u32,
    pub status: ArtifactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An executable script artifact, one-to-one with its Orb. `orb_id` is a
/// non-owning back-reference; the Rune's status always mirrors the Orb's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rune {
    pub id: Uuid,
    pub orb_id: Uuid,
    pub script: String,
    pub language: String,
    pub status: ArtifactStatus,
}

/// A candidate Orb before identity assignment
#[derive(Debug, Clone)]
pub struct CandidateOrb {
    pub domain: Domain,
    pub title: String,
    pub description: String,
    pub category: Category,
    /// The text the fingerprint is computed from (the sanitized primary
    /// text, before title truncation)
    pub fingerprint_text: String,
}

impl CandidateOrb {
    /// The dedup key this candidate resolves to
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.domain, &self.fingerprint_text)
    }
}

/// A candidate Rune before identity assignment
#[derive(Debug, Clone)]
pub struct CandidateRune {
    pub script: String,
    pub language: String,
}
