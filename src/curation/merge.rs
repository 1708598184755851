//! Fingerprint-keyed dedup and merge
//!
//! The merge engine is the only component that assigns artifact identity.
//! A candidate either creates a new Orb (fingerprint unseen in the domain)
//! or folds into the existing one: the id is kept, the description is
//! optionally extended, the Rune script is replaced only when the candidate's
//! is richer, and the recurrence counter increments by exactly one.
//! Recurrence counts occurrences, not distinct candidates, so merging the
//! same candidate twice increments twice but never duplicates the identity.
//!
//! Callers must hold the domain shard's mutex across each call.

use super::store::DomainShard;
use crate::artifact::{ArtifactStatus, CandidateOrb, CandidateRune, Fingerprint, Orb, Rune};
use crate::config::MergePolicy;
use chrono::Utc;
use uuid::Uuid;

/// Outcome of merging one candidate into a domain
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The stable Orb id, newly assigned or pre-existing
    pub artifact_id: Uuid,
    /// Whether a new identity was created
    pub is_new: bool,
    /// The fingerprint the candidate resolved to
    pub matched_fingerprint: Fingerprint,
    /// Orb status after the merge (before any recurrence decision)
    pub status: ArtifactStatus,
}

/// Deduplicates candidates against a domain's existing artifact set
pub struct MergeEngine {
    policy: MergePolicy,
}

impl MergeEngine {
    /// Create an engine with the given merge policy
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    /// Merge a candidate into the shard. Idempotent on identity: repeated
    /// application of the same candidate never creates a second Orb.
    pub fn merge(
        &self,
        shard: &mut DomainShard,
        candidate: CandidateOrb,
        rune: Option<CandidateRune>,
    ) -> MergeResult {
        let fingerprint = candidate.fingerprint();

        if shard.orb_by_fingerprint(&fingerprint).is_none() {
            return self.insert_new(shard, candidate, rune, fingerprint);
        }
        self.fold_into_existing(shard, candidate, rune, fingerprint)
    }

    fn insert_new(
        &self,
        shard: &mut DomainShard,
        candidate: CandidateOrb,
        rune: Option<CandidateRune>,
        fingerprint: Fingerprint,
    ) -> MergeResult {
        let now = Utc::now();
        let orb = Orb {
            id: Uuid::new_v4(),
            domain: candidate.domain,
            title: candidate.title,
            description: candidate.description,
            category: candidate.category,
            fingerprint: fingerprint.clone(),
            recurrence_count: 1,
            status: ArtifactStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let artifact_id = orb.id;
        let rune = rune.map(|r| Rune {
            id: Uuid::new_v4(),
            orb_id: artifact_id,
            script: r.script,
            language: r.language,
            status: ArtifactStatus::Pending,
        });

        tracing::debug!(orb = %artifact_id, fingerprint = %fingerprint, "new artifact identity");
        shard.insert(orb, rune);

        MergeResult {
            artifact_id,
            is_new: true,
            matched_fingerprint: fingerprint,
            status: ArtifactStatus::Pending,
        }
    }

    fn fold_into_existing(
        &self,
        shard: &mut DomainShard,
        candidate: CandidateOrb,
        rune: Option<CandidateRune>,
        fingerprint: Fingerprint,
    ) -> MergeResult {
        let extend = self.policy.extend_descriptions;
        let (artifact_id, status) = {
            let orb = shard
                .orb_by_fingerprint_mut(&fingerprint)
                .expect("fingerprint checked before fold");

            // Append only when the candidate adds text not already present
            if extend && !orb.description.contains(&candidate.description) {
                orb.description.push('\n');
                orb.description.push_str(&candidate.description);
            }

            orb.recurrence_count += 1;
            orb.updated_at = Utc::now();
            (orb.id, orb.status)
        };

        if let Some(candidate_rune) = rune {
            self.merge_rune(shard, artifact_id, status, candidate_rune);
        }

        tracing::debug!(orb = %artifact_id, fingerprint = %fingerprint, "merged into existing artifact");

        MergeResult {
            artifact_id,
            is_new: false,
            matched_fingerprint: fingerprint,
            status,
        }
    }

    /// Richer-wins script merge: the candidate replaces the existing script
    /// only when the existing one is empty or the candidate is strictly
    /// longer. A missing Rune counts as empty.
    fn merge_rune(
        &self,
        shard: &mut DomainShard,
        orb_id: Uuid,
        status: ArtifactStatus,
        candidate: CandidateRune,
    ) {
        match shard.rune_for_mut(orb_id) {
            None => {
                shard.attach_rune(
                    orb_id,
                    Rune {
                        id: Uuid::new_v4(),
                        orb_id,
                        script: candidate.script,
                        language: candidate.language,
                        status,
                    },
                );
            }
            Some(existing) => {
                if self.policy.richer_script_wins
                    && (existing.script.is_empty()
                        || candidate.script.len() > existing.script.len())
                {
                    existing.script = candidate.script;
                    existing.language = candidate.language;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Category, SCRIPT_LANGUAGE_SHELL};
    use crate::classify::Domain;

    fn candidate(text: &str) -> CandidateOrb {
        CandidateOrb {
            domain: Domain::ClusterOperations,
            title: text.to_string(),
            description: format!("Operator task: {text}"),
            category: Category::Procedure,
            fingerprint_text: text.to_string(),
        }
    }

    fn cand_rune(script: &str) -> CandidateRune {
        CandidateRune {
            script: script.to_string(),
            language: SCRIPT_LANGUAGE_SHELL.to_string(),
        }
    }

    fn engine() -> MergeEngine {
        MergeEngine::new(MergePolicy::default())
    }

    #[test]
    fn test_first_merge_creates_identity() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let result = engine().merge(&mut shard, candidate("restart the nginx pod"), None);
        assert!(result.is_new);
        assert_eq!(result.status, ArtifactStatus::Pending);
        let orb = shard.orb_by_id(result.artifact_id).unwrap();
        assert_eq!(orb.recurrence_count, 1);
    }

    #[test]
    fn test_repeated_merge_is_idempotent_on_identity() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let first = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        let second = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        let third = e.merge(&mut shard, candidate("restart the nginx pod"), None);

        assert!(!second.is_new);
        assert!(!third.is_new);
        assert_eq!(first.artifact_id, second.artifact_id);
        assert_eq!(second.artifact_id, third.artifact_id);
        assert_eq!(shard.len(), 1);
        // Recurrence counts occurrences, not distinct candidates
        assert_eq!(
            shard.orb_by_id(first.artifact_id).unwrap().recurrence_count,
            3
        );
    }

    #[test]
    fn test_case_and_whitespace_variants_merge() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let first = e.merge(&mut shard, candidate("Restart the  NGINX pod"), None);
        let second = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        assert_eq!(first.artifact_id, second.artifact_id);
        assert!(!second.is_new);
    }

    #[test]
    fn test_description_appended_when_new_information() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let mut a = candidate("restart the nginx pod");
        a.description = "check readiness first".to_string();
        let mut b = candidate("restart the nginx pod");
        b.description = "then watch the rollout".to_string();

        let result = e.merge(&mut shard, a, None);
        e.merge(&mut shard, b, None);
        let orb = shard.orb_by_id(result.artifact_id).unwrap();
        assert!(orb.description.contains("check readiness first"));
        assert!(orb.description.contains("then watch the rollout"));
    }

    #[test]
    fn test_description_not_duplicated_when_substring() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let result = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        e.merge(&mut shard, candidate("restart the nginx pod"), None);
        let orb = shard.orb_by_id(result.artifact_id).unwrap();
        assert_eq!(orb.description, "Operator task: restart the nginx pod");
    }

    #[test]
    fn test_richer_script_wins() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let result = e.merge(
            &mut shard,
            candidate("restart the nginx pod"),
            Some(cand_rune("#short\n")),
        );
        e.merge(
            &mut shard,
            candidate("restart the nginx pod"),
            Some(cand_rune("#a noticeably longer script body\n")),
        );
        let rune = shard.rune_for(result.artifact_id).unwrap();
        assert!(rune.script.contains("longer"));

        // A shorter candidate does not replace the richer script
        e.merge(
            &mut shard,
            candidate("restart the nginx pod"),
            Some(cand_rune("#x\n")),
        );
        let rune = shard.rune_for(result.artifact_id).unwrap();
        assert!(rune.script.contains("longer"));
    }

    #[test]
    fn test_missing_rune_counts_as_empty() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let result = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        assert!(shard.rune_for(result.artifact_id).is_none());

        e.merge(
            &mut shard,
            candidate("restart the nginx pod"),
            Some(cand_rune("#late script\n")),
        );
        let rune = shard.rune_for(result.artifact_id).unwrap();
        assert_eq!(rune.orb_id, result.artifact_id);
        assert!(rune.script.contains("late script"));
    }

    #[test]
    fn test_policy_can_disable_both_heuristics() {
        let e = MergeEngine::new(MergePolicy {
            extend_descriptions: false,
            richer_script_wins: false,
        });
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let mut a = candidate("restart the nginx pod");
        a.description = "original".to_string();
        let mut b = candidate("restart the nginx pod");
        b.description = "unrelated addition".to_string();

        let result = e.merge(&mut shard, a, Some(cand_rune("#one\n")));
        e.merge(
            &mut shard,
            b,
            Some(cand_rune("#a much longer replacement\n")),
        );
        let orb = shard.orb_by_id(result.artifact_id).unwrap();
        assert_eq!(orb.description, "original");
        assert_eq!(shard.rune_for(result.artifact_id).unwrap().script, "#one\n");
        // Recurrence still increments under a frozen policy
        assert_eq!(orb.recurrence_count, 2);
    }

    #[test]
    fn test_merge_preserves_existing_status() {
        let mut shard = DomainShard::new(Domain::ClusterOperations);
        let e = engine();
        let result = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        shard
            .set_status(result.artifact_id, ArtifactStatus::Rejected)
            .unwrap();

        let again = e.merge(&mut shard, candidate("restart the nginx pod"), None);
        assert!(!again.is_new);
        assert_eq!(again.status, ArtifactStatus::Rejected);
    }
}
