//! Post-session derivation: summary, action items, participants.
//!
//! Three independent generation calls over the full rendered transcript, one
//! scoped thread each, fan-in to disjoint fields of the result. A failed call
//! becomes a sentinel marker for its field only; `run` never returns an error
//! and never aborts sibling calls.

use crate::context::render_transcript;
use crate::transcript::TranscriptEntry;
use muninn_voice::{BackendResult, GenerationBackend};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// A derived value or an explicit failure marker; never absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionField {
    Value(String),
    Failed { reason: String },
}

impl ExtractionField {
    pub fn value(&self) -> Option<&str> {
        match self {
            ExtractionField::Value(v) => Some(v),
            ExtractionField::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionField::Failed { .. })
    }

    fn from_call(label: &str, result: BackendResult<String>) -> Self {
        match result {
            Ok(text) => ExtractionField::Value(text),
            Err(e) => {
                warn!("extraction call '{}' failed: {}", label, e);
                ExtractionField::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// The structured artifacts of one session. Every field is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub summary: ExtractionField,
    pub action_items: ExtractionField,
    pub participants: ExtractionField,
}

impl ExtractionResult {
    pub fn fully_populated(&self) -> bool {
        !self.summary.is_failed() && !self.action_items.is_failed() && !self.participants.is_failed()
    }

    fn all_failed(reason: &str) -> Self {
        let failed = ExtractionField::Failed {
            reason: reason.to_string(),
        };
        Self {
            summary: failed.clone(),
            action_items: failed.clone(),
            participants: failed,
        }
    }
}

fn summary_prompt(transcript: &str) -> String {
    format!(
        "Provide a comprehensive meeting summary based on this transcript:\n\n\
         TRANSCRIPT:\n{}\n\n\
         Include:\n\
         1. Meeting Overview (brief summary)\n\
         2. Key Discussion Points (bullet points)\n\
         3. Decisions Made (bullet points)\n\
         4. Action Items (who, what, when)\n\
         5. Next Steps\n\n\
         Format clearly with headers.",
        transcript
    )
}

fn action_items_prompt(transcript: &str) -> String {
    format!(
        "Extract all action items from this meeting transcript.\n\
         For each action item, identify:\n\
         - Task description\n\
         - Assigned person (if mentioned)\n\
         - Deadline (if mentioned)\n\n\
         Transcript:\n{}\n\nAction items:",
        transcript
    )
}

fn participants_prompt(transcript: &str) -> String {
    format!(
        "Identify all meeting participants from this transcript.\n\
         List their names and any roles mentioned.\n\n\
         Transcript:\n{}\n\nParticipants:",
        transcript
    )
}

/// Runs the three derivation calls against a generation backend.
pub struct ExtractionPipeline {
    backend: Arc<dyn GenerationBackend>,
}

impl ExtractionPipeline {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Derive all three artifacts from the full transcript. Each call is
    /// isolated; the calls share no mutable state and write to disjoint
    /// fields. An empty transcript short-circuits without calling the backend.
    pub fn run(&self, transcript: &[TranscriptEntry]) -> ExtractionResult {
        if transcript.is_empty() {
            info!("extraction skipped: empty transcript");
            return ExtractionResult::all_failed("empty transcript");
        }

        let rendered = render_transcript(transcript);
        let backend = self.backend.as_ref();

        let result = thread::scope(|s| {
            let summary = s.spawn(|| backend.generate(&summary_prompt(&rendered)));
            let action_items = s.spawn(|| backend.generate(&action_items_prompt(&rendered)));
            let participants = s.spawn(|| backend.generate(&participants_prompt(&rendered)));
            ExtractionResult {
                summary: join_call("summary", summary),
                action_items: join_call("action_items", action_items),
                participants: join_call("participants", participants),
            }
        });

        info!(
            "extraction finished over {} entries (complete: {})",
            transcript.len(),
            result.fully_populated()
        );
        result
    }
}

fn join_call(
    label: &str,
    handle: thread::ScopedJoinHandle<'_, BackendResult<String>>,
) -> ExtractionField {
    match handle.join() {
        Ok(result) => ExtractionField::from_call(label, result),
        Err(_) => ExtractionField::Failed {
            reason: format!("{} worker panicked", label),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use muninn_voice::{BackendError, PlaceholderGeneration};

    fn entries(texts: &[&str]) -> Vec<TranscriptEntry> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptEntry {
                sequence: i as u64 + 1,
                timestamp: Utc::now(),
                text: t.to_string(),
            })
            .collect()
    }

    /// Fails only the participants call; everything else echoes.
    struct ParticipantsDown;

    impl GenerationBackend for ParticipantsDown {
        fn generate(&self, prompt: &str) -> BackendResult<String> {
            if prompt.starts_with("Identify all meeting participants") {
                Err(BackendError::Generation("provider outage".to_string()))
            } else {
                Ok(format!("ok: {} chars", prompt.len()))
            }
        }
    }

    #[test]
    fn all_three_fields_populated_on_success() {
        let pipeline = ExtractionPipeline::new(Arc::new(PlaceholderGeneration::new()));
        let transcript = entries(&["hello", "let's begin", "action: Bob send report by Friday"]);
        let result = pipeline.run(&transcript);
        assert!(result.fully_populated());
        assert!(result.summary.value().is_some());
        assert!(result.action_items.value().is_some());
        assert!(result.participants.value().is_some());
    }

    #[test]
    fn one_failure_does_not_poison_siblings() {
        let pipeline = ExtractionPipeline::new(Arc::new(ParticipantsDown));
        let result = pipeline.run(&entries(&["Bob: ship it", "Alice: by Friday"]));
        assert!(result.summary.value().is_some());
        assert!(result.action_items.value().is_some());
        assert!(result.participants.is_failed());
        match result.participants {
            ExtractionField::Failed { ref reason } => assert!(reason.contains("provider outage")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_transcript_short_circuits() {
        let pipeline = ExtractionPipeline::new(Arc::new(PlaceholderGeneration::new()));
        let result = pipeline.run(&[]);
        assert!(result.summary.is_failed());
        assert!(result.action_items.is_failed());
        assert!(result.participants.is_failed());
    }

    #[test]
    fn sentinel_round_trips_through_json() {
        let field = ExtractionField::Failed {
            reason: "outage".to_string(),
        };
        let json = serde_json::to_string(&field).unwrap();
        let back: ExtractionField = serde_json::from_str(&json).unwrap();
        assert_eq!(field, back);
    }
}
