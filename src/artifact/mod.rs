//! Knowledge artifact types and generation
//!
//! An Orb is a descriptive knowledge unit (title, description, category); a
//! Rune is its optional executable counterpart. Candidates produced by the
//! generator carry no identity yet — identity is assigned by the merge
//! engine against the domain's existing artifact set, keyed by fingerprint.

pub mod fingerprint;
pub mod generator;
pub mod types;

pub use fingerprint::{normalize, Fingerprint};
pub use generator::ArtifactGenerator;
pub use types::{
    ArtifactStatus, CandidateOrb, CandidateRune, Category, Orb, Rune, SCRIPT_LANGUAGE_SHELL,
};
