//! Raw operator input types
//!
//! A [`RawInput`] is one operator interaction as handed over by the transport
//! layer: a manual task description, a Q&A pair, OCR text from a screenshot,
//! a transcript, a fix-log, or a structured solution entry. Payloads are a
//! tagged union over the fixed `input_type` enumeration, so an unknown type
//! fails at deserialization instead of deep inside the pipeline.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The fixed enumeration of input types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Task,
    Qna,
    InfoDump,
    Image,
    Fixlog,
    SolutionEntry,
    Transcript,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Qna => write!(f, "qna"),
            Self::InfoDump => write!(f, "info_dump"),
            Self::Image => write!(f, "image"),
            Self::Fixlog => write!(f, "fixlog"),
            Self::SolutionEntry => write!(f, "solution_entry"),
            Self::Transcript => write!(f, "transcript"),
        }
    }
}

impl std::str::FromStr for InputType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "task" => Ok(Self::Task),
            "qna" => Ok(Self::Qna),
            "info_dump" => Ok(Self::InfoDump),
            "image" => Ok(Self::Image),
            "fixlog" => Ok(Self::Fixlog),
            "solution_entry" => Ok(Self::SolutionEntry),
            "transcript" => Ok(Self::Transcript),
            other => Err(Error::Validation(format!("unknown input type: {other}"))),
        }
    }
}

/// Typed payload, tagged by input type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPayload {
    Task(TaskPayload),
    Qna(QnaPayload),
    InfoDump(InfoDumpPayload),
    Image(ImagePayload),
    Fixlog(FixlogPayload),
    SolutionEntry(SolutionEntryPayload),
    Transcript(TranscriptPayload),
}

impl InputPayload {
    /// The input type this payload carries
    pub fn input_type(&self) -> InputType {
        match self {
            Self::Task(_) => InputType::Task,
            Self::Qna(_) => InputType::Qna,
            Self::InfoDump(_) => InputType::InfoDump,
            Self::Image(_) => InputType::Image,
            Self::Fixlog(_) => InputType::Fixlog,
            Self::SolutionEntry(_) => InputType::SolutionEntry,
            Self::Transcript(_) => InputType::Transcript,
        }
    }

    /// The primary text used for classification and fingerprinting.
    ///
    /// Per input type: task description, Q&A question, info-dump content,
    /// OCR text, fixlog description, solution description plus steps,
    /// transcript text.
    pub fn primary_text(&self) -> String {
        match self {
            Self::Task(p) => p.description.clone(),
            Self::Qna(p) => p.question.clone(),
            Self::InfoDump(p) => p.content.clone(),
            Self::Image(p) => p.ocr_text.clone(),
            Self::Fixlog(p) => p.description.clone(),
            Self::SolutionEntry(p) => {
                let mut text = p.description.clone();
                for step in &p.steps {
                    text.push(' ');
                    text.push_str(step);
                }
                text
            }
            Self::Transcript(p) => p.text.clone(),
        }
    }
}

/// A manual task description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// A question/answer pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QnaPayload {
    pub question: String,
    pub answer: String,
}

/// Free-form informational text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoDumpPayload {
    pub content: String,
}

/// OCR text extracted from a screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub ocr_text: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// A problem description with its resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixlogPayload {
    pub description: String,
    pub resolution: String,
}

/// A description with an ordered list of solution steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionEntryPayload {
    pub description: String,
    pub steps: Vec<String>,
}

/// A conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptPayload {
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
}

/// One raw operator interaction, immutable once received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    /// Where the interaction came from (channel, tool, operator handle)
    pub source: String,

    /// The typed payload
    pub payload: InputPayload,

    /// Arbitrary string metadata attached by the transport layer
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// When the transport layer received the interaction
    pub received_at: DateTime<Utc>,
}

impl RawInput {
    /// Create a raw input received now
    pub fn new(source: impl Into<String>, payload: InputPayload) -> Self {
        Self {
            source: source.into(),
            payload,
            metadata: HashMap::new(),
            received_at: Utc::now(),
        }
    }

    /// The input type of this interaction
    pub fn input_type(&self) -> InputType {
        self.payload.input_type()
    }

    /// Parse a raw input from a JSON document, rejecting unknown input types
    /// before any pipeline stage runs.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Validation(format!("invalid raw input: {e}")))
    }

    /// Validate the input before sanitization. Rejects payloads with no
    /// primary text, since nothing downstream could be derived from them.
    pub fn validate(&self) -> Result<()> {
        if self.payload.primary_text().trim().is_empty() {
            return Err(Error::Validation(format!(
                "{} input from '{}' has no primary text",
                self.input_type(),
                self.source
            )));
        }
        Ok(())
    }
}
