//! Best-effort redaction of secrets and PII-shaped substrings
//!
//! The sanitizer is a pure, total transformation: it never fails and never
//! drops input. Two passes run in a fixed order. First a case-sensitive
//! literal denylist is applied in a single left-to-right scan
//! (first-match-wins per occurrence), then an ordered set of structural
//! patterns each claims what is left. The pattern priority order is part of
//! the contract: higher-priority patterns take text before lower-priority
//! ones can match overlapping substrings, which keeps the output
//! deterministic.
//!
//! This is pattern redaction, not a cryptographic guarantee.

use crate::config::SanitizerConfig;
use crate::error::{Error, Result};
use crate::input::{InputPayload, InputType, RawInput};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Placeholder for denylisted literals
const REDACTED: &str = "<REDACTED>";

/// Builtin case-sensitive denylist of security-sensitive words
const DENYLIST: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "apikey",
    "api_key",
    "token",
    "credential",
    "private_key",
];

/// One structural redaction pattern with its placeholder
struct RedactionPattern {
    name: &'static str,
    regex: Regex,
    placeholder: &'static str,
}

/// A [`RawInput`] after redaction, plus a per-pattern match report.
/// Derived once, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizedRecord {
    pub source: String,
    pub payload: InputPayload,
    pub metadata: HashMap<String, String>,
    pub received_at: DateTime<Utc>,
    pub report: SanitizationReport,
}

impl SanitizedRecord {
    /// The input type of the underlying interaction
    pub fn input_type(&self) -> InputType {
        self.payload.input_type()
    }
}

/// Counts of redactions per pattern. Denylist hits are aggregated under
/// the `denylist` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanitizationReport {
    pub patterns_matched: BTreeMap<String, u32>,
}

impl SanitizationReport {
    fn record(&mut self, name: &str, count: u32) {
        if count > 0 {
            *self.patterns_matched.entry(name.to_string()).or_insert(0) += count;
        }
    }

    /// Total number of redactions across all patterns
    pub fn total(&self) -> u32 {
        self.patterns_matched.values().sum()
    }
}

/// Redacts denylisted literals and structural patterns from raw input
pub struct Sanitizer {
    denylist: Vec<String>,
    patterns: Vec<RedactionPattern>,
}

impl Sanitizer {
    /// Compile the redaction patterns. The pattern order here is the
    /// priority order and must not be reshuffled.
    pub fn new(config: &SanitizerConfig) -> Result<Self> {
        let mut denylist: Vec<String> = DENYLIST.iter().map(|s| s.to_string()).collect();
        denylist.extend(config.extra_denylist.iter().cloned());

        let specs: &[(&'static str, &'static str, &'static str)] = &[
            ("ip", r"\b(?:\d{1,3}\.){3}\d{1,3}\b", "<IP>"),
            (
                "email",
                r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
                "<EMAIL>",
            ),
            ("path", r"(?:/[A-Za-z0-9._-]+){2,}/?", "<PATH>"),
            (
                "namespace",
                r"\b(?:ns|namespace)-[a-z0-9][a-z0-9-]*\b",
                "<NAMESPACE>",
            ),
            ("error_id", r"\b0x[0-9A-Fa-f]{4,}\b", "<ERROR_ID>"),
            (
                "domain",
                r"\b[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)*\.[a-z]{2,}\b",
                "<DOMAIN>",
            ),
        ];

        let mut patterns = Vec::with_capacity(specs.len());
        for (name, pattern, placeholder) in specs {
            let regex = Regex::new(pattern)
                .map_err(|e| Error::Config(format!("bad redaction pattern '{name}': {e}")))?;
            patterns.push(RedactionPattern {
                name,
                regex,
                placeholder,
            });
        }

        Ok(Self { denylist, patterns })
    }

    /// Sanitize one raw input. Every string field of the payload and every
    /// metadata value passes through redaction; structure and ordering
    /// (including solution step order) are preserved.
    pub fn sanitize(&self, input: &RawInput) -> SanitizedRecord {
        let mut report = SanitizationReport::default();

        let payload = match &input.payload {
            InputPayload::Task(p) => InputPayload::Task(crate::input::TaskPayload {
                description: self.sanitize_text(&p.description, &mut report),
                priority: p
                    .priority
                    .as_ref()
                    .map(|s| self.sanitize_text(s, &mut report)),
            }),
            InputPayload::Qna(p) => InputPayload::Qna(crate::input::QnaPayload {
                question: self.sanitize_text(&p.question, &mut report),
                answer: self.sanitize_text(&p.answer, &mut report),
            }),
            InputPayload::InfoDump(p) => InputPayload::InfoDump(crate::input::InfoDumpPayload {
                content: self.sanitize_text(&p.content, &mut report),
            }),
            InputPayload::Image(p) => InputPayload::Image(crate::input::ImagePayload {
                ocr_text: self.sanitize_text(&p.ocr_text, &mut report),
                caption: p
                    .caption
                    .as_ref()
                    .map(|s| self.sanitize_text(s, &mut report)),
            }),
            InputPayload::Fixlog(p) => InputPayload::Fixlog(crate::input::FixlogPayload {
                description: self.sanitize_text(&p.description, &mut report),
                resolution: self.sanitize_text(&p.resolution, &mut report),
            }),
            InputPayload::SolutionEntry(p) => {
                // Each step sanitized independently, list order preserved
                InputPayload::SolutionEntry(crate::input::SolutionEntryPayload {
                    description: self.sanitize_text(&p.description, &mut report),
                    steps: p
                        .steps
                        .iter()
                        .map(|s| self.sanitize_text(s, &mut report))
                        .collect(),
                })
            }
            InputPayload::Transcript(p) => InputPayload::Transcript(crate::input::TranscriptPayload {
                text: self.sanitize_text(&p.text, &mut report),
                speaker: p
                    .speaker
                    .as_ref()
                    .map(|s| self.sanitize_text(s, &mut report)),
            }),
        };

        let metadata = input
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), self.sanitize_text(v, &mut report)))
            .collect();

        SanitizedRecord {
            source: input.source.clone(),
            payload,
            metadata,
            received_at: input.received_at,
            report,
        }
    }

    /// Sanitize a single text field: denylist pass, then each structural
    /// pattern in priority order.
    fn sanitize_text(&self, text: &str, report: &mut SanitizationReport) -> String {
        let mut text = self.redact_literals(text, report);

        for pattern in &self.patterns {
            let count = pattern.regex.find_iter(&text).count() as u32;
            if count > 0 {
                report.record(pattern.name, count);
                text = pattern
                    .regex
                    .replace_all(&text, pattern.placeholder)
                    .into_owned();
            }
        }

        text
    }

    /// Single left-to-right scan over the text. At each position the
    /// denylist is tested in order; the first matching literal is replaced
    /// and the scan resumes after it.
    fn redact_literals(&self, text: &str, report: &mut SanitizationReport) -> String {
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            if let Some(word) = self.denylist.iter().find(|w| rest.starts_with(w.as_str())) {
                out.push_str(REDACTED);
                report.record("denylist", 1);
                i += word.len();
            } else if let Some(ch) = rest.chars().next() {
                out.push(ch);
                i += ch.len_utf8();
            } else {
                break;
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputPayload, SolutionEntryPayload, TaskPayload};

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(&SanitizerConfig::default()).unwrap()
    }

    fn task(description: &str) -> RawInput {
        RawInput::new(
            "test",
            InputPayload::Task(TaskPayload {
                description: description.to_string(),
                priority: None,
            }),
        )
    }

    #[test]
    fn test_denylist_literal_redacted() {
        let s = sanitizer();
        let record = s.sanitize(&task("set the password to hunter2"));
        let text = record.payload.primary_text();
        assert!(!text.contains("password"));
        assert!(text.contains("<REDACTED>"));
        assert_eq!(record.report.patterns_matched["denylist"], 1);
    }

    #[test]
    fn test_denylist_is_case_sensitive() {
        let s = sanitizer();
        let record = s.sanitize(&task("the Password field stays"));
        assert!(record.payload.primary_text().contains("Password"));
    }

    #[test]
    fn test_namespace_claimed_before_denylist_free_words() {
        let s = sanitizer();
        let record = s.sanitize(&task("restart the nginx pod in ns-prod-east"));
        let text = record.payload.primary_text();
        assert!(text.contains("<NAMESPACE>"), "got: {text}");
        assert!(!text.contains("prod"), "got: {text}");
    }

    #[test]
    fn test_email_claims_its_domain_part() {
        let s = sanitizer();
        let record = s.sanitize(&task("escalate to oncall@corp.io"));
        let text = record.payload.primary_text();
        assert!(text.contains("<EMAIL>"), "got: {text}");
        assert!(!text.contains("<DOMAIN>"), "got: {text}");
    }

    #[test]
    fn test_ip_path_and_error_id() {
        let s = sanitizer();
        let record = s.sanitize(&task(
            "host 10.0.4.12 wrote /var/log/app/err.log with code 0xDEADBEEF",
        ));
        let text = record.payload.primary_text();
        assert!(text.contains("<IP>"));
        assert!(text.contains("<PATH>"));
        assert!(text.contains("<ERROR_ID>"));
    }

    #[test]
    fn test_bare_domain_redacted() {
        let s = sanitizer();
        let record = s.sanitize(&task("the registry at images.internal.example.com is slow"));
        assert!(record.payload.primary_text().contains("<DOMAIN>"));
    }

    #[test]
    fn test_deterministic() {
        let s = sanitizer();
        let input = task("password for admin@corp.io on 10.0.0.1 in ns-prod-east");
        let a = s.sanitize(&input);
        let b = s.sanitize(&input);
        assert_eq!(a.payload.primary_text(), b.payload.primary_text());
        assert_eq!(a.report.patterns_matched, b.report.patterns_matched);
    }

    #[test]
    fn test_solution_steps_sanitized_in_order() {
        let s = sanitizer();
        let input = RawInput::new(
            "test",
            InputPayload::SolutionEntry(SolutionEntryPayload {
                description: "rotate credentials".to_string(),
                steps: vec![
                    "export the secret from vault".to_string(),
                    "apply in ns-prod-east".to_string(),
                    "verify the pods".to_string(),
                ],
            }),
        );
        let record = s.sanitize(&input);
        let steps = match &record.payload {
            InputPayload::SolutionEntry(p) => &p.steps,
            other => panic!("unexpected payload: {other:?}"),
        };
        assert_eq!(steps.len(), 3);
        assert!(steps[0].contains("<REDACTED>"));
        assert!(steps[1].contains("<NAMESPACE>"));
        assert_eq!(steps[2], "verify the pods");
    }

    #[test]
    fn test_metadata_values_sanitized() {
        let s = sanitizer();
        let mut input = task("routine check");
        input
            .metadata
            .insert("reporter".to_string(), "ops@corp.io".to_string());
        let record = s.sanitize(&input);
        assert_eq!(record.metadata["reporter"], "<EMAIL>");
    }

    #[test]
    fn test_extra_denylist_from_config() {
        let config = SanitizerConfig {
            extra_denylist: vec!["hunter2".to_string()],
        };
        let s = Sanitizer::new(&config).unwrap();
        let record = s.sanitize(&task("the value is hunter2"));
        assert!(!record.payload.primary_text().contains("hunter2"));
    }
}
