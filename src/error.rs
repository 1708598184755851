//! Runeforge error types

use thiserror::Error;
use uuid::Uuid;

/// Runeforge error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unknown input, rejected before sanitization
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown approval request or artifact id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Approval request was already resolved
    #[error("Approval request {0} is already resolved")]
    AlreadyResolved(Uuid),

    /// A second open approval request was attempted for one Orb.
    /// Carries the id of the existing open request so callers can recover.
    #[error("Orb {orb_id} already has an open approval request {existing}")]
    DuplicateApproval { orb_id: Uuid, existing: Uuid },

    /// Two writers raced on the same fingerprint; the merge step must be retried
    #[error("Storage contention in domain '{0}'")]
    StorageContention(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Runeforge operations
pub type Result<T> = std::result::Result<T, Error>;
