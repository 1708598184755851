//! Candidate artifact generation
//!
//! Turns a classified, sanitized record into a candidate Orb and, when the
//! input implies an executable procedure (tasks, fix-logs, solution
//! entries), a companion Rune skeleton. All text is deterministic templating
//! over the sanitized payload; a language-generation collaborator could be
//! substituted here without changing the pipeline contract.

use super::types::{CandidateOrb, CandidateRune, Category, SCRIPT_LANGUAGE_SHELL};
use crate::classify::Domain;
use crate::input::InputPayload;
use crate::sanitize::SanitizedRecord;

/// Maximum title length in characters
const TITLE_MAX_CHARS: usize = 80;

/// Deterministic candidate generator
pub struct ArtifactGenerator;

impl ArtifactGenerator {
    /// Generate a candidate Orb (and Rune skeleton where applicable) from a
    /// sanitized record. The candidate carries no id; identity assignment
    /// happens in the merge engine.
    pub fn generate(
        record: &SanitizedRecord,
        domain: Domain,
    ) -> (CandidateOrb, Option<CandidateRune>) {
        let primary_text = record.payload.primary_text();
        let title = summarize(&primary_text);

        let (category, description, rune) = match &record.payload {
            InputPayload::Task(p) => {
                let script = format!(
                    "#!/usr/bin/env bash\n# Procedure: {title}\n# {}\n",
                    p.description
                );
                (
                    Category::Procedure,
                    format!("Operator task: {}", p.description),
                    Some(script),
                )
            }
            InputPayload::Qna(p) => (
                Category::Faq,
                format!("Q: {}\nA: {}", p.question, p.answer),
                None,
            ),
            InputPayload::InfoDump(p) => (Category::Reference, p.content.clone(), None),
            InputPayload::Image(p) => {
                let mut description = format!("Screenshot observation: {}", p.ocr_text);
                if let Some(caption) = &p.caption {
                    description.push_str(&format!(" ({caption})"));
                }
                (Category::Observation, description, None)
            }
            InputPayload::Fixlog(p) => {
                let script = format!(
                    "#!/usr/bin/env bash\n# Remediation: {title}\n# Fix: {}\n",
                    p.resolution
                );
                (
                    Category::Remediation,
                    format!("Problem: {}\nFix: {}", p.description, p.resolution),
                    Some(script),
                )
            }
            InputPayload::SolutionEntry(p) => {
                let mut description = p.description.clone();
                let mut script = format!("#!/usr/bin/env bash\n# Runbook: {title}\n");
                for (i, step) in p.steps.iter().enumerate() {
                    description.push_str(&format!("\n{}. {}", i + 1, step));
                    script.push_str(&format!("# {}. {}\n", i + 1, step));
                }
                (Category::Runbook, description, Some(script))
            }
            InputPayload::Transcript(p) => {
                let description = match &p.speaker {
                    Some(speaker) => format!("Transcript from {speaker}: {}", p.text),
                    None => format!("Transcript: {}", p.text),
                };
                (Category::Conversation, description, None)
            }
        };

        let candidate = CandidateOrb {
            domain,
            title,
            description,
            category,
            fingerprint_text: primary_text,
        };

        let rune = rune.map(|script| CandidateRune {
            script,
            language: SCRIPT_LANGUAGE_SHELL.to_string(),
        });

        (candidate, rune)
    }
}

/// Collapse whitespace and truncate to the title budget on a char boundary
fn summarize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(TITLE_MAX_CHARS).collect()
}
