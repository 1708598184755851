//! Durable capability store
//!
//! Per domain: a mapping from Orb fingerprint to Orb record, a mapping from
//! Orb id to Rune record, and the insertion order of fingerprints (the
//! capability-set ordering). Each domain lives behind its own
//! `tokio::sync::Mutex`, which is the merge serialization boundary from the
//! concurrency model. Snapshots persist as JSON under
//! `<data_dir>/domains/<domain>.json`, loaded on open.
//!
//! The read path (`list`) reflects only approved artifacts. All writes go
//! through the merge engine, recurrence tracker, or approval gate — no other
//! component mutates stored artifacts.

use crate::artifact::{ArtifactStatus, Fingerprint, Orb, Rune};
use crate::classify::Domain;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One approved Orb+Rune pair as seen by downstream agent selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

/// All artifact state for one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainShard {
    pub domain: Domain,
    orbs: HashMap<Fingerprint, Orb>,
    /// Runes keyed by the owning Orb's id
    runes: HashMap<Uuid, Rune>,
    /// Fingerprints in insertion order; merge never reorders
    order: Vec<Fingerprint>,
}

impl DomainShard {
    /// Create an empty shard for a domain
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            orbs: HashMap::new(),
            runes: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Look up an Orb by fingerprint
    pub fn orb_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<&Orb> {
        self.orbs.get(fingerprint)
    }

    /// Mutable Orb lookup by fingerprint
    pub fn orb_by_fingerprint_mut(&mut self, fingerprint: &Fingerprint) -> Option<&mut Orb> {
        self.orbs.get_mut(fingerprint)
    }

    /// Look up an Orb by id
    pub fn orb_by_id(&self, orb_id: Uuid) -> Option<&Orb> {
        self.orbs.values().find(|o| o.id == orb_id)
    }

    /// The Rune owned by an Orb, if any
    pub fn rune_for(&self, orb_id: Uuid) -> Option<&Rune> {
        self.runes.get(&orb_id)
    }

    /// Mutable Rune lookup
    pub fn rune_for_mut(&mut self, orb_id: Uuid) -> Option<&mut Rune> {
        self.runes.get_mut(&orb_id)
    }

    /// Insert a brand-new Orb (and optional Rune). The fingerprint must not
    /// already be present; the merge engine guarantees this.
    pub fn insert(&mut self, orb: Orb, rune: Option<Rune>) {
        debug_assert!(!self.orbs.contains_key(&orb.fingerprint));
        self.order.push(orb.fingerprint.clone());
        if let Some(rune) = rune {
            self.runes.insert(orb.id, rune);
        }
        self.orbs.insert(orb.fingerprint.clone(), orb);
    }

    /// Attach a Rune to an existing Orb
    pub fn attach_rune(&mut self, orb_id: Uuid, rune: Rune) {
        self.runes.insert(orb_id, rune);
    }

    /// Apply a status transition to an Orb and mirror it onto its Rune.
    ///
    /// Transitions out of a terminal status (`approved`, `rejected`) are
    /// refused, except the no-op same-status case. The explicit
    /// rejected-to-pending override lives in [`CapabilityStore::reopen_rejected`].
    pub fn set_status(&mut self, orb_id: Uuid, status: ArtifactStatus) -> Result<Orb> {
        let orb = self
            .orbs
            .values_mut()
            .find(|o| o.id == orb_id)
            .ok_or_else(|| Error::NotFound(format!("orb {orb_id}")))?;

        if orb.status != status {
            if orb.status != ArtifactStatus::Pending {
                return Err(Error::Validation(format!(
                    "orb {orb_id} is {} and cannot transition to {status}",
                    orb.status
                )));
            }
            orb.status = status;
            orb.updated_at = chrono::Utc::now();
        }
        let orb = orb.clone();

        // Invariant: a Rune's status always mirrors its owning Orb's
        if let Some(rune) = self.runes.get_mut(&orb_id) {
            rune.status = status;
        }
        Ok(orb)
    }

    /// Explicit override: move a rejected Orb back to pending
    fn reopen(&mut self, orb_id: Uuid) -> Result<Orb> {
        let orb = self
            .orbs
            .values_mut()
            .find(|o| o.id == orb_id)
            .ok_or_else(|| Error::NotFound(format!("orb {orb_id}")))?;

        if orb.status != ArtifactStatus::Rejected {
            return Err(Error::Validation(format!(
                "orb {orb_id} is {}, only rejected orbs can be reopened",
                orb.status
            )));
        }
        orb.status = ArtifactStatus::Pending;
        orb.updated_at = chrono::Utc::now();
        let orb = orb.clone();

        if let Some(rune) = self.runes.get_mut(&orb_id) {
            rune.status = ArtifactStatus::Pending;
        }
        Ok(orb)
    }

    /// Orbs in insertion order
    pub fn orbs_ordered(&self) -> impl Iterator<Item = &Orb> {
        self.order.iter().filter_map(|fp| self.orbs.get(fp))
    }

    /// Approved capabilities in insertion order
    pub fn capabilities(&self) -> Vec<Capability> {
        self.orbs_ordered()
            .filter(|orb| orb.status == ArtifactStatus::Approved)
            .map(|orb| Capability {
                title: orb.title.clone(),
                description: orb.description.clone(),
                script: self.rune_for(orb.id).map(|r| r.script.clone()),
            })
            .collect()
    }

    /// Number of Orbs in this shard
    pub fn len(&self) -> usize {
        self.orbs.len()
    }

    /// Whether the shard holds no Orbs
    pub fn is_empty(&self) -> bool {
        self.orbs.is_empty()
    }
}

/// The durable, queryable set of artifacts across all domains
pub struct CapabilityStore {
    data_dir: Option<PathBuf>,
    shards: RwLock<HashMap<Domain, Arc<Mutex<DomainShard>>>>,
}

impl CapabilityStore {
    /// Open the store, loading any JSON snapshots under `data_dir`
    pub async fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let mut shards = HashMap::new();

        if let Some(dir) = &data_dir {
            let domains_dir = dir.join("domains");
            tokio::fs::create_dir_all(&domains_dir).await?;
            for domain in Domain::all() {
                let path = domains_dir.join(format!("{domain}.json"));
                if !path.exists() {
                    continue;
                }
                match tokio::fs::read_to_string(&path).await {
                    Ok(data) => match serde_json::from_str::<DomainShard>(&data) {
                        Ok(shard) => {
                            shards.insert(*domain, Arc::new(Mutex::new(shard)));
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse shard {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => tracing::warn!("Failed to read shard {}: {}", path.display(), e),
                }
            }
        }

        Ok(Self {
            data_dir,
            shards: RwLock::new(shards),
        })
    }

    /// The serialized shard for a domain, created on first use. Cloning the
    /// `Arc` keeps the per-domain mutex shared across callers.
    pub async fn shard(&self, domain: Domain) -> Arc<Mutex<DomainShard>> {
        {
            let shards = self.shards.read().await;
            if let Some(shard) = shards.get(&domain) {
                return shard.clone();
            }
        }
        let mut shards = self.shards.write().await;
        shards
            .entry(domain)
            .or_insert_with(|| Arc::new(Mutex::new(DomainShard::new(domain))))
            .clone()
    }

    /// Ordered approved Orb+Rune pairs for a domain
    pub async fn list(&self, domain: Domain) -> Vec<Capability> {
        let shard = self.shard(domain).await;
        let shard = shard.lock().await;
        shard.capabilities()
    }

    /// Find an Orb by id across all domains
    pub async fn find_orb(&self, orb_id: Uuid) -> Option<Orb> {
        let shards: Vec<_> = self.shards.read().await.values().cloned().collect();
        for shard in shards {
            let shard = shard.lock().await;
            if let Some(orb) = shard.orb_by_id(orb_id) {
                return Some(orb.clone());
            }
        }
        None
    }

    /// Apply a status transition within a domain, mirroring the Rune
    pub async fn set_status(
        &self,
        domain: Domain,
        orb_id: Uuid,
        status: ArtifactStatus,
    ) -> Result<Orb> {
        let shard = self.shard(domain).await;
        let orb = {
            let mut shard = shard.lock().await;
            shard.set_status(orb_id, status)?
        };
        self.persist(domain).await;
        Ok(orb)
    }

    /// Explicit override moving a rejected Orb back to pending
    pub async fn reopen_rejected(&self, domain: Domain, orb_id: Uuid) -> Result<Orb> {
        let shard = self.shard(domain).await;
        let orb = {
            let mut shard = shard.lock().await;
            shard.reopen(orb_id)?
        };
        self.persist(domain).await;
        Ok(orb)
    }

    /// Write the domain's JSON snapshot. Best-effort: failures are logged,
    /// not surfaced, so a full disk never corrupts in-memory curation.
    pub async fn persist(&self, domain: Domain) {
        let Some(dir) = &self.data_dir else {
            return;
        };
        let shard = self.shard(domain).await;
        let json = {
            let shard = shard.lock().await;
            serde_json::to_string_pretty(&*shard)
        };
        let path = dir.join("domains").join(format!("{domain}.json"));
        match json {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&path, json).await {
                    tracing::warn!("Failed to persist domain {}: {}", domain, e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize domain {}: {}", domain, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Category, SCRIPT_LANGUAGE_SHELL};
    use chrono::Utc;

    fn orb(domain: Domain, text: &str, status: ArtifactStatus) -> Orb {
        Orb {
            id: Uuid::new_v4(),
            domain,
            title: text.to_string(),
            description: text.to_string(),
            category: Category::Procedure,
            fingerprint: Fingerprint::compute(domain, text),
            recurrence_count: 1,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rune(orb: &Orb, script: &str) -> Rune {
        Rune {
            id: Uuid::new_v4(),
            orb_id: orb.id,
            script: script.to_string(),
            language: SCRIPT_LANGUAGE_SHELL.to_string(),
            status: orb.status,
        }
    }

    #[test]
    fn test_capabilities_reflect_only_approved_in_order() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let first = orb(
            Domain::ClusterOperations,
            "drain node",
            ArtifactStatus::Approved,
        );
        let second = orb(
            Domain::ClusterOperations,
            "restart pod",
            ArtifactStatus::Pending,
        );
        let third = orb(
            Domain::ClusterOperations,
            "resize pool",
            ArtifactStatus::Approved,
        );
        let third_rune = rune(&third, "#!/bin/sh\n");
        shard.insert(first, None);
        shard.insert(second, None);
        shard.insert(third.clone(), Some(third_rune));

        let caps = shard.capabilities();
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[0].title, "drain node");
        assert_eq!(caps[1].title, "resize pool");
        assert!(caps[0].script.is_none());
        assert!(caps[1].script.is_some());
    }

    #[test]
    fn test_set_status_mirrors_rune() {
        let mut shard = DomainShard::new(Domain::General);
        let o = orb(Domain::General, "fix the thing", ArtifactStatus::Pending);
        let r = rune(&o, "#!/bin/sh\n");
        let orb_id = o.id;
        shard.insert(o, Some(r));

        shard.set_status(orb_id, ArtifactStatus::Approved).unwrap();
        assert_eq!(
            shard.orb_by_id(orb_id).unwrap().status,
            ArtifactStatus::Approved
        );
        assert_eq!(
            shard.rune_for(orb_id).unwrap().status,
            ArtifactStatus::Approved
        );
    }

    #[test]
    fn test_terminal_status_does_not_revert() {
        let mut shard = DomainShard::new(Domain::General);
        let o = orb(Domain::General, "fix the thing", ArtifactStatus::Pending);
        let orb_id = o.id;
        shard.insert(o, None);

        shard.set_status(orb_id, ArtifactStatus::Approved).unwrap();
        // Same-status transition is a no-op
        shard.set_status(orb_id, ArtifactStatus::Approved).unwrap();
        // Reverting is refused
        let err = shard
            .set_status(orb_id, ArtifactStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = shard
            .set_status(orb_id, ArtifactStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_reopen_only_from_rejected() {
        let mut shard = DomainShard::new(Domain::General);
        let o = orb(Domain::General, "fix the thing", ArtifactStatus::Pending);
        let orb_id = o.id;
        shard.insert(o, None);

        assert!(shard.reopen(orb_id).is_err());
        shard.set_status(orb_id, ArtifactStatus::Rejected).unwrap();
        let reopened = shard.reopen(orb_id).unwrap();
        assert_eq!(reopened.status, ArtifactStatus::Pending);
    }

    #[tokio::test]
    async fn test_store_shard_is_shared() {
        let store = CapabilityStore::open(None).await.unwrap();
        let a = store.shard(Domain::General).await;
        let b = store.shard(Domain::General).await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Some(dir.path().to_path_buf());

        {
            let store = CapabilityStore::open(data_dir.clone()).await.unwrap();
            let shard = store.shard(Domain::MlTraining).await;
            {
                let mut shard = shard.lock().await;
                let o = orb(
                    Domain::MlTraining,
                    "resume from checkpoint",
                    ArtifactStatus::Approved,
                );
                shard.insert(o, None);
            }
            store.persist(Domain::MlTraining).await;
        }

        let reloaded = CapabilityStore::open(data_dir).await.unwrap();
        let caps = reloaded.list(Domain::MlTraining).await;
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].title, "resume from checkpoint");
    }
}
