//! Human approval gate
//!
//! Artifacts that are new or below the promotion threshold wait here until
//! a human approves or rejects them. The central concurrency invariant is
//! at-most-one open request per Orb: a second request for the same Orb
//! recovers by returning the existing one. Resolution is terminal; resolving
//! a closed request fails rather than silently re-applying.
//!
//! The reviewer is an independent asynchronous actor, so requests are
//! durable (JSON snapshot) and carry no deadline.

use crate::artifact::Orb;
use crate::classify::Domain;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Stored decision state of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Still open
    None,
    Approved,
    Rejected,
}

/// A reviewer's verdict when resolving a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ApprovalDecision {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::Approved,
            ReviewDecision::Rejected => Self::Rejected,
        }
    }
}

/// One request for human review of an Orb (and its Rune, if any)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub orb_id: Uuid,
    pub rune_id: Option<Uuid>,
    /// Domain of the Orb, so resolution knows which shard to update
    pub domain: Domain,
    pub created_at: DateTime<Utc>,
    pub decision: ApprovalDecision,
    pub feedback: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// Whether the request is still awaiting a decision
    pub fn is_open(&self) -> bool {
        self.decision == ApprovalDecision::None
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GateState {
    requests: HashMap<Uuid, ApprovalRequest>,
    /// Orb id -> open request id; the at-most-one-open invariant
    open_by_orb: HashMap<Uuid, Uuid>,
}

/// Holds pending artifacts until a human decides
pub struct ApprovalGate {
    data_dir: Option<PathBuf>,
    state: RwLock<GateState>,
}

impl ApprovalGate {
    /// Open the gate, loading any persisted requests
    pub async fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let mut state = GateState::default();

        if let Some(dir) = &data_dir {
            tokio::fs::create_dir_all(dir).await?;
            let path = dir.join("approvals.json");
            if path.exists() {
                match tokio::fs::read_to_string(&path).await {
                    Ok(data) => match serde_json::from_str::<GateState>(&data) {
                        Ok(loaded) => state = loaded,
                        Err(e) => {
                            tracing::warn!("Failed to parse approvals {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => tracing::warn!("Failed to read approvals {}: {}", path.display(), e),
                }
            }
        }

        Ok(Self {
            data_dir,
            state: RwLock::new(state),
        })
    }

    /// Request human review for an Orb. If an open request already exists
    /// for this Orb the existing request is returned, preserving its id —
    /// a duplicate request is always recoverable.
    pub async fn request_approval(&self, orb: &Orb, rune_id: Option<Uuid>) -> ApprovalRequest {
        match self.open_request(orb, rune_id).await {
            Ok(request) => {
                self.persist().await;
                request
            }
            Err(existing) => {
                tracing::debug!(orb = %orb.id, request = %existing.id, "reusing open approval request");
                existing
            }
        }
    }

    /// Strict variant: one write-lock critical section enforcing the
    /// at-most-one-open invariant. The error side carries the existing open
    /// request.
    async fn open_request(
        &self,
        orb: &Orb,
        rune_id: Option<Uuid>,
    ) -> std::result::Result<ApprovalRequest, ApprovalRequest> {
        let mut state = self.state.write().await;

        if let Some(existing) = state
            .open_by_orb
            .get(&orb.id)
            .and_then(|id| state.requests.get(id))
        {
            return Err(existing.clone());
        }

        let request = ApprovalRequest {
            id: Uuid::new_v4(),
            orb_id: orb.id,
            rune_id,
            domain: orb.domain,
            created_at: Utc::now(),
            decision: ApprovalDecision::None,
            feedback: None,
            resolved_at: None,
        };
        state.open_by_orb.insert(orb.id, request.id);
        state.requests.insert(request.id, request.clone());
        tracing::debug!(orb = %orb.id, request = %request.id, "opened approval request");
        Ok(request)
    }

    /// Open a request, failing with [`Error::DuplicateApproval`] instead of
    /// recovering. Callers that need to distinguish "new" from "reused" use
    /// this and map the error themselves.
    pub async fn try_request_approval(
        &self,
        orb: &Orb,
        rune_id: Option<Uuid>,
    ) -> Result<ApprovalRequest> {
        match self.open_request(orb, rune_id).await {
            Ok(request) => {
                self.persist().await;
                Ok(request)
            }
            Err(existing) => Err(Error::DuplicateApproval {
                orb_id: orb.id,
                existing: existing.id,
            }),
        }
    }

    /// Look up a request by id, open or resolved
    pub async fn get(&self, approval_id: Uuid) -> Option<ApprovalRequest> {
        let state = self.state.read().await;
        state.requests.get(&approval_id).cloned()
    }

    /// All open requests, oldest first
    pub async fn list_pending(&self) -> Vec<ApprovalRequest> {
        let state = self.state.read().await;
        let mut pending: Vec<ApprovalRequest> = state
            .requests
            .values()
            .filter(|r| r.is_open())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending
    }

    /// The open request for an Orb, if any
    pub async fn open_request_for(&self, orb_id: Uuid) -> Option<ApprovalRequest> {
        let state = self.state.read().await;
        state
            .open_by_orb
            .get(&orb_id)
            .and_then(|id| state.requests.get(id))
            .cloned()
    }

    /// Apply a reviewer's decision to a request. Fails with `NotFound` for
    /// unknown ids and `AlreadyResolved` for closed requests.
    pub async fn resolve(
        &self,
        approval_id: Uuid,
        decision: ReviewDecision,
        feedback: Option<String>,
    ) -> Result<ApprovalRequest> {
        let request = {
            let mut state = self.state.write().await;

            let request = state
                .requests
                .get_mut(&approval_id)
                .ok_or_else(|| Error::NotFound(format!("approval request {approval_id}")))?;

            if !request.is_open() {
                return Err(Error::AlreadyResolved(approval_id));
            }

            request.decision = decision.into();
            request.feedback = feedback;
            request.resolved_at = Some(Utc::now());
            let request = request.clone();
            state.open_by_orb.remove(&request.orb_id);
            request
        };

        self.persist().await;
        tracing::info!(
            request = %request.id,
            orb = %request.orb_id,
            decision = ?request.decision,
            "approval request resolved"
        );
        Ok(request)
    }

    /// Resolve the open request for an Orb, if one exists. Used when
    /// recurrence promotion bypasses the gate so no stale open request
    /// lingers.
    pub async fn resolve_open_for_orb(
        &self,
        orb_id: Uuid,
        decision: ReviewDecision,
        feedback: &str,
    ) -> Option<ApprovalRequest> {
        let open = self.open_request_for(orb_id).await?;
        self.resolve(open.id, decision, Some(feedback.to_string()))
            .await
            .ok()
    }

    /// Best-effort JSON snapshot of the gate state
    async fn persist(&self) {
        let Some(dir) = &self.data_dir else {
            return;
        };
        let json = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
        };
        let path = dir.join("approvals.json");
        match json {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&path, json).await {
                    tracing::warn!("Failed to persist approvals: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize approvals: {}", e),
        }
    }
}
