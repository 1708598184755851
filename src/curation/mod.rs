//! The stateful curation authority
//!
//! Everything before this module is a stateless transformation; everything
//! in it mutates the durable artifact state. Entry into a domain's shard is
//! serialized through a per-domain mutex so two concurrent candidates with
//! the same fingerprint can never both observe "no match" — this is the
//! pipeline's only mandatory mutual-exclusion boundary. Domains are never
//! serialized against each other.

pub mod approval;
pub mod merge;
pub mod recurrence;
pub mod store;

pub use approval::{ApprovalDecision, ApprovalGate, ApprovalRequest, ReviewDecision};
pub use merge::{MergeEngine, MergeResult};
pub use recurrence::{Decision, RecurrenceTracker};
pub use store::{Capability, CapabilityStore, DomainShard};
