//! Runeforge configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Runeforge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuneforgeConfig {
    /// Curation pipeline configuration
    #[serde(default)]
    pub curation: CurationConfig,

    /// Merge policy configuration
    #[serde(default)]
    pub merge: MergePolicy,

    /// Sanitizer configuration
    #[serde(default)]
    pub sanitizer: SanitizerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Curation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Recurrence count at which an artifact is auto-approved without
    /// human review
    pub promotion_threshold: u32,

    /// Retry attempts for a merge step that hits storage contention
    pub merge_retries: u32,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            promotion_threshold: 3,
            merge_retries: 3,
        }
    }
}

/// Merge policy for candidates that match an existing artifact.
///
/// Both heuristics are inferred defaults rather than hard semantics, so they
/// are exposed as configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Append candidate description text when it is not already a substring
    /// of the existing description
    pub extend_descriptions: bool,

    /// Replace an existing Rune script when the candidate script is strictly
    /// longer (or the existing script is empty)
    pub richer_script_wins: bool,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            extend_descriptions: true,
            richer_script_wins: true,
        }
    }
}

/// Sanitizer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Extra case-sensitive literals to redact in addition to the builtin
    /// denylist
    pub extra_denylist: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for JSON snapshots. `None` keeps all state in memory.
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Default data directory (~/.runeforge)
    pub fn default_dir() -> PathBuf {
        dirs_next::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".runeforge")
    }
}
