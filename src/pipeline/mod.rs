//! The curation pipeline facade
//!
//! Wires the stateless stages (sanitize, classify, generate) into the
//! stateful authority (merge, recurrence, approval, store) and exposes the
//! external interface consumed by the transport, agent-selection, and
//! review layers: `ingest`, `get_capabilities`, `list_pending`, `resolve`,
//! and the explicit `reopen` override.
//!
//! The stateless stages share no mutable state, so any number of inputs may
//! run through them concurrently; a raw input abandoned before the merge
//! step leaves no trace. Per-domain serialization happens inside
//! [`CapabilityStore`]'s shard mutex.

use crate::artifact::{ArtifactGenerator, ArtifactStatus, CandidateOrb, CandidateRune, Orb};
use crate::classify::{Classifier, Domain};
use crate::config::RuneforgeConfig;
use crate::curation::{
    ApprovalGate, ApprovalRequest, Capability, CapabilityStore, Decision, MergeEngine,
    RecurrenceTracker, ReviewDecision,
};
use crate::error::{Error, Result};
use crate::input::RawInput;
use crate::sanitize::Sanitizer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Feedback recorded when recurrence promotion closes an open request
const AUTO_PROMOTE_FEEDBACK: &str = "auto-approved: recurrence threshold reached";

/// Result of ingesting one raw input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub artifact_id: Uuid,
    pub domain: Domain,
    pub status: ArtifactStatus,
    pub is_new: bool,
}

/// The single curation authority over all domains
pub struct CurationPipeline {
    sanitizer: Sanitizer,
    engine: MergeEngine,
    tracker: RecurrenceTracker,
    gate: ApprovalGate,
    store: CapabilityStore,
    merge_retries: u32,
}

impl CurationPipeline {
    /// Build a pipeline from configuration, loading persisted state
    pub async fn new(config: &RuneforgeConfig) -> Result<Self> {
        let sanitizer = Sanitizer::new(&config.sanitizer)?;
        let store = CapabilityStore::open(config.storage.data_dir.clone()).await?;
        let gate = ApprovalGate::open(config.storage.data_dir.clone()).await?;

        Ok(Self {
            sanitizer,
            engine: MergeEngine::new(config.merge.clone()),
            tracker: RecurrenceTracker::new(config.curation.promotion_threshold),
            gate,
            store,
            merge_retries: config.curation.merge_retries,
        })
    }

    /// Ingest one raw operator interaction through the full pipeline.
    ///
    /// Fails with `Validation` before any stage runs if the input is
    /// malformed. Every other stage degrades rather than fails, so errors
    /// stay local to this one input.
    pub async fn ingest(&self, input: RawInput) -> Result<IngestOutcome> {
        input.validate()?;

        // Stateless stages: no shared state, abandonable at any boundary
        let record = self.sanitizer.sanitize(&input);
        let domain = Classifier::classify(&record);
        let (candidate, rune) = ArtifactGenerator::generate(&record, domain);

        tracing::debug!(
            domain = %domain,
            input_type = %record.input_type(),
            redactions = record.report.total(),
            "input entering merge",
        );

        // Stateful authority, retried on storage contention
        let mut attempt = 0;
        loop {
            match self.merge_and_gate(domain, candidate.clone(), rune.clone()).await {
                Err(Error::StorageContention(d)) if attempt < self.merge_retries => {
                    attempt += 1;
                    tracing::warn!(domain = %d, attempt, "retrying merge after contention");
                }
                other => return other,
            }
        }
    }

    /// The serialized portion of ingest: merge, recurrence decision, status
    /// application, and gate bookkeeping all run under the domain shard's
    /// mutex. The gate branch must not run outside it: a promotion and an
    /// older hold could otherwise interleave after their merges, leaving an
    /// approved Orb with a request opened from a stale Pending snapshot.
    async fn merge_and_gate(
        &self,
        domain: Domain,
        candidate: CandidateOrb,
        rune: Option<CandidateRune>,
    ) -> Result<IngestOutcome> {
        let shard = self.store.shard(domain).await;

        let (orb, is_new) = {
            let mut shard = shard.lock().await;
            let merged = self.engine.merge(&mut shard, candidate, rune);
            let orb_id = merged.artifact_id;

            let decision = {
                let orb = shard
                    .orb_by_id(orb_id)
                    .ok_or_else(|| Error::Internal(format!("merged orb {orb_id} vanished")))?;
                self.tracker.evaluate(orb)
            };
            let orb = match decision {
                Decision::Promote => shard.set_status(orb_id, ArtifactStatus::Approved)?,
                Decision::Hold => shard
                    .orb_by_id(orb_id)
                    .cloned()
                    .ok_or_else(|| Error::Internal(format!("merged orb {orb_id} vanished")))?,
            };
            let rune_id = shard.rune_for(orb_id).map(|r| r.id);

            match orb.status {
                ArtifactStatus::Approved => {
                    // Promotion bypassed the gate; close any request it left open
                    if let Some(request) = self
                        .gate
                        .resolve_open_for_orb(
                            orb.id,
                            ReviewDecision::Approved,
                            AUTO_PROMOTE_FEEDBACK,
                        )
                        .await
                    {
                        tracing::info!(orb = %orb.id, request = %request.id, "promotion closed open request");
                    }
                }
                ArtifactStatus::Pending => {
                    self.gate.request_approval(&orb, rune_id).await;
                }
                ArtifactStatus::Rejected => {
                    // Known-rejected knowledge is never silently re-queued
                    tracing::info!(orb = %orb.id, "candidate matched a rejected artifact");
                }
            }

            (orb, merged.is_new)
        };

        self.store.persist(domain).await;

        Ok(IngestOutcome {
            artifact_id: orb.id,
            domain,
            status: orb.status,
            is_new,
        })
    }

    /// Ordered approved capabilities for a domain
    pub async fn get_capabilities(&self, domain: Domain) -> Vec<Capability> {
        self.store.list(domain).await
    }

    /// Open approval requests, oldest first
    pub async fn list_pending(&self) -> Vec<ApprovalRequest> {
        self.gate.list_pending().await
    }

    /// Apply a reviewer decision to an open request and transition the Orb
    /// (and its Rune) accordingly.
    ///
    /// The Orb transitions first: if the store refuses the transition the
    /// request stays open instead of recording a decision the store never
    /// applied.
    pub async fn resolve(
        &self,
        approval_id: Uuid,
        decision: ReviewDecision,
        feedback: Option<String>,
    ) -> Result<Orb> {
        let request = self
            .gate
            .get(approval_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("approval request {approval_id}")))?;
        if !request.is_open() {
            return Err(Error::AlreadyResolved(approval_id));
        }

        let status = match decision {
            ReviewDecision::Approved => ArtifactStatus::Approved,
            ReviewDecision::Rejected => ArtifactStatus::Rejected,
        };
        let orb = self
            .store
            .set_status(request.domain, request.orb_id, status)
            .await?;
        self.gate.resolve(approval_id, decision, feedback).await?;
        Ok(orb)
    }

    /// Explicit override re-submitting a rejected Orb for review
    pub async fn reopen(&self, orb_id: Uuid) -> Result<ApprovalRequest> {
        let orb = self
            .store
            .find_orb(orb_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("orb {orb_id}")))?;
        let orb = self.store.reopen_rejected(orb.domain, orb_id).await?;

        let shard = self.store.shard(orb.domain).await;
        let rune_id = {
            let shard = shard.lock().await;
            shard.rune_for(orb_id).map(|r| r.id)
        };
        Ok(self.gate.request_approval(&orb, rune_id).await)
    }
}
