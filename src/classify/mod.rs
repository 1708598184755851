//! Deterministic capability-domain classification
//!
//! One ordered `(domain, keyword set)` table drives classification; the same
//! table is exported for capability matching so the two can never drift.
//! Domains are tested in table order and the first domain with a keyword hit
//! wins, so domains listed earlier are higher-precedence signals —
//! cluster-operations keywords are deliberately checked before the generic
//! infrastructure keywords. Redaction placeholders inserted by the sanitizer
//! (`<NAMESPACE>`, `<PATH>`, ...) are stripped before matching so they never
//! act as keywords. Classification never fails: with no hit the fallback
//! domain is returned and the gap is logged.

use crate::error::{Error, Result};
use crate::sanitize::SanitizedRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The fixed set of capability domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    ClusterOperations,
    InfrastructureAutomation,
    MlTraining,
    SecurityAudit,
    /// Fallback when no keyword set matches
    General,
}

impl Domain {
    /// All domains in classification priority order
    pub fn all() -> &'static [Domain] {
        &[
            Domain::ClusterOperations,
            Domain::InfrastructureAutomation,
            Domain::MlTraining,
            Domain::SecurityAudit,
            Domain::General,
        ]
    }

    /// The keyword set for this domain from the shared table
    pub fn keywords(&self) -> &'static [&'static str] {
        DOMAIN_KEYWORDS
            .iter()
            .find(|(d, _)| d == self)
            .map(|(_, kws)| *kws)
            .unwrap_or(&[])
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClusterOperations => write!(f, "cluster-operations"),
            Self::InfrastructureAutomation => write!(f, "infrastructure-automation"),
            Self::MlTraining => write!(f, "ml-training"),
            Self::SecurityAudit => write!(f, "security-audit"),
            Self::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cluster-operations" => Ok(Self::ClusterOperations),
            "infrastructure-automation" => Ok(Self::InfrastructureAutomation),
            "ml-training" => Ok(Self::MlTraining),
            "security-audit" => Ok(Self::SecurityAudit),
            "general" => Ok(Self::General),
            other => Err(Error::Validation(format!("unknown domain: {other}"))),
        }
    }
}

/// The single ordered keyword table. Order is classification priority and
/// must be preserved for reproducible results. Single words match whole
/// tokens; keywords containing a space match as phrases.
pub const DOMAIN_KEYWORDS: &[(Domain, &[&str])] = &[
    (
        Domain::ClusterOperations,
        &[
            "pod", "pods", "kubectl", "kubernetes", "k8s", "namespace", "helm", "deployment",
            "replica", "replicas", "ingress", "kubelet", "node pool",
        ],
    ),
    (
        Domain::InfrastructureAutomation,
        &[
            "terraform", "ansible", "provision", "provisioning", "vm", "dns", "nginx", "server",
            "restart", "systemd", "load balancer",
        ],
    ),
    (
        Domain::MlTraining,
        &[
            "training", "gpu", "model", "dataset", "checkpoint", "epoch", "cuda", "finetune",
        ],
    ),
    (
        Domain::SecurityAudit,
        &[
            "vulnerability", "cve", "audit", "rbac", "certificate", "tls", "compliance", "breach",
        ],
    ),
];

/// Maps a sanitized record to exactly one capability domain
pub struct Classifier;

impl Classifier {
    /// Classify a sanitized record by its primary text
    pub fn classify(record: &SanitizedRecord) -> Domain {
        Self::classify_text(&record.payload.primary_text())
    }

    /// Classify free text. Total and deterministic.
    pub fn classify_text(text: &str) -> Domain {
        let stripped = strip_redaction_markers(text);
        let lower = stripped.to_lowercase();
        let tokens: HashSet<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .filter(|t| !t.is_empty())
            .collect();

        for (domain, keywords) in DOMAIN_KEYWORDS {
            for keyword in *keywords {
                let hit = if keyword.contains(' ') {
                    lower.contains(keyword)
                } else {
                    tokens.contains(keyword)
                };
                if hit {
                    tracing::debug!(domain = %domain, keyword = %keyword, "classified input");
                    return *domain;
                }
            }
        }

        // Not an error: a signal that the keyword tables have a gap
        tracing::info!("classification fell back to the general domain");
        Domain::General
    }
}

/// Remove sanitizer placeholders (`<NAMESPACE>`, `<ERROR_ID>`, ...) so their
/// words cannot collide with domain keywords. Only uppercase/underscore
/// angle-bracket spans are treated as placeholders; any other `<` passes
/// through untouched.
fn strip_redaction_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        match tail.find('>') {
            Some(end)
                if end > 0
                    && tail[..end]
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c == '_') =>
            {
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('<');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_keywords_beat_infrastructure() {
        // "restart" is an infrastructure keyword, "pod" is cluster; the
        // cluster table is checked first
        assert_eq!(
            Classifier::classify_text("restart the nginx pod in <NAMESPACE>"),
            Domain::ClusterOperations
        );
    }

    #[test]
    fn test_infrastructure_without_cluster_signal() {
        assert_eq!(
            Classifier::classify_text("restart the nginx service on the web server"),
            Domain::InfrastructureAutomation
        );
    }

    #[test]
    fn test_ml_training() {
        assert_eq!(
            Classifier::classify_text("resume training from the last checkpoint"),
            Domain::MlTraining
        );
    }

    #[test]
    fn test_security_audit() {
        assert_eq!(
            Classifier::classify_text("rotate the expiring tls certificate"),
            Domain::SecurityAudit
        );
    }

    #[test]
    fn test_fallback_domain() {
        assert_eq!(
            Classifier::classify_text("water the office plants"),
            Domain::General
        );
    }

    #[test]
    fn test_whole_token_matching() {
        // "podcast" must not match the "pod" keyword
        assert_eq!(
            Classifier::classify_text("edit the weekly podcast"),
            Domain::General
        );
    }

    #[test]
    fn test_phrase_keyword() {
        assert_eq!(
            Classifier::classify_text("resize the node pool"),
            Domain::ClusterOperations
        );
    }

    #[test]
    fn test_redaction_markers_are_not_keywords() {
        // "<NAMESPACE>" must not count as the cluster keyword "namespace"
        assert_eq!(
            Classifier::classify_text("provision the vm in <NAMESPACE>"),
            Domain::InfrastructureAutomation
        );
        assert_eq!(
            Classifier::classify_text("<REDACTED> <PATH> <NAMESPACE>"),
            Domain::General
        );
    }

    #[test]
    fn test_literal_angle_brackets_pass_through() {
        assert_eq!(
            Classifier::classify_text("compare a < b for the gpu batch"),
            Domain::MlTraining
        );
    }

    #[test]
    fn test_deterministic() {
        let text = "audit the kubernetes rbac rules";
        assert_eq!(
            Classifier::classify_text(text),
            Classifier::classify_text(text)
        );
    }

    #[test]
    fn test_domain_round_trip() {
        for domain in Domain::all() {
            let parsed: Domain = domain.to_string().parse().unwrap();
            assert_eq!(parsed, *domain);
        }
    }

    #[test]
    fn test_every_domain_has_table_entry_except_fallback() {
        for domain in Domain::all() {
            if *domain == Domain::General {
                assert!(domain.keywords().is_empty());
            } else {
                assert!(!domain.keywords().is_empty());
            }
        }
    }
}
