//! Runeforge - Curation pipeline for operator knowledge
//!
//! Runeforge ingests raw operator interactions (task descriptions, Q&A
//! pairs, OCR text, transcripts, fix-logs), strips sensitive content,
//! classifies each item by capability domain, and incrementally builds a
//! knowledge base of reusable best-practice artifacts: descriptive **Orbs**
//! and their executable **Rune** counterparts. Recurring, validated
//! knowledge is promoted automatically; novel or uncertain knowledge waits
//! for human approval before joining any capability set.
//!
//! ## Architecture
//!
//! ```text
//! raw input ──▶ Sanitizer ──▶ Classifier ──▶ Artifact Generator
//!                (stateless, parallel, abandonable)        │
//!                                                          ▼
//!               ┌────────────── per-domain mutex ──────────────────┐
//!               │  Merge Engine ──▶ Recurrence Tracker             │
//!               │       │                   │                      │
//!               │       ▼                   ├─ promote ──▶ approved│
//!               │  Capability Store         └─ hold ─▶ Approval    │
//!               │  (fingerprint → Orb,                  Gate       │
//!               │   orb id → Rune)                                 │
//!               └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`input`]: raw interaction types (tagged payload union)
//! - [`sanitize`]: denylist + ordered-pattern redaction
//! - [`classify`]: keyword-table domain classification
//! - [`artifact`]: Orb/Rune types, fingerprints, candidate generation
//! - [`curation`]: merge engine, recurrence tracker, approval gate, store
//! - [`pipeline`]: the ingest/query/resolve facade
//! - [`config`]: configuration management

pub mod artifact;
pub mod classify;
pub mod config;
pub mod curation;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod sanitize;

pub use config::RuneforgeConfig;
pub use error::{Error, Result};
pub use pipeline::{CurationPipeline, IngestOutcome};
