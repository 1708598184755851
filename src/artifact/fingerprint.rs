//! Deterministic artifact fingerprints
//!
//! The fingerprint is the dedup key within a domain: SHA-256 over the domain
//! id and the normalized candidate text. Normalization is lowercase,
//! whitespace collapse, and a light stopword trim, so surface wording
//! differences beyond that still count as "the same knowledge".

use crate::classify::Domain;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stopwords dropped during normalization. Deliberately short: the goal is
/// tolerance to filler words, not semantic equivalence.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "in", "on", "of", "to", "for", "is", "are", "and", "or", "with", "please",
];

/// A stable dedup key for one piece of knowledge within a domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for candidate text within a domain
    pub fn compute(domain: Domain, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain.to_string().as_bytes());
        hasher.update(b"\n");
        hasher.update(normalize(text).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize text for fingerprinting: lowercase, collapse whitespace, drop
/// stopwords.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}
