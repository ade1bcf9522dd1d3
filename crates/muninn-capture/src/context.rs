//! Bounded prompt context: recent turns plus a compact profile snippet.
//!
//! Deterministic given the same inputs: no randomness, no hidden state. The
//! same formatting serves live per-turn prompting (last K turns) and the
//! extraction pipeline (entire log).

use crate::memory::MemoryRecord;
use crate::transcript::TranscriptEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of turns in a live context window.
pub const DEFAULT_CONTEXT_TURNS: usize = 3;

/// Topics carried in the profile snippet, most-recent-first.
pub const PROFILE_TOPIC_LIMIT: usize = 5;

/// Compact identity profile for prompting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileSnippet {
    pub name: Option<String>,
    /// Up to [`PROFILE_TOPIC_LIMIT`] topics, most recent first.
    pub recent_topics: Vec<String>,
    pub preferences: BTreeMap<String, String>,
}

/// Ordered slice of history plus profile data, assembled for prompting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextWindow {
    /// At most K turns, chronological (oldest first).
    pub turns: Vec<TranscriptEntry>,
    pub profile: ProfileSnippet,
}

impl ContextWindow {
    /// Chat-style prompt: profile block, recent turns, then the current input.
    pub fn render_prompt(&self, current: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "You are a helpful assistant chatting with {}.\n",
            self.profile.name.as_deref().unwrap_or("a user")
        ));
        if !self.profile.recent_topics.is_empty() {
            out.push_str(&format!(
                "Topics previously discussed: {}\n",
                self.profile.recent_topics.join(", ")
            ));
        }
        for (key, value) in &self.profile.preferences {
            out.push_str(&format!("Preference: {} = {}\n", key, value));
        }
        if !self.turns.is_empty() {
            out.push_str("\nRecent conversation:\n");
            out.push_str(&render_transcript(&self.turns));
            out.push('\n');
        }
        out.push_str(&format!("\nCurrent user message: {}", current));
        out
    }

    /// Transcript-only rendering, one `- text` line per turn.
    pub fn render_transcript(&self) -> String {
        render_transcript(&self.turns)
    }
}

/// One `- text` line per entry, chronological. This is the format every
/// generation consumer sees.
pub fn render_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("- {}", e.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stateless assembler for [`ContextWindow`]s.
pub struct ContextWindowBuilder;

impl ContextWindowBuilder {
    /// Last `k` entries (fewer if unavailable), chronological, plus the
    /// profile snippet derived from `record`.
    pub fn build(record: &MemoryRecord, entries: &[TranscriptEntry], k: usize) -> ContextWindow {
        let start = entries.len().saturating_sub(k);
        ContextWindow {
            turns: entries[start..].to_vec(),
            profile: ProfileSnippet {
                name: record.name.clone(),
                recent_topics: record
                    .topics
                    .iter()
                    .rev()
                    .take(PROFILE_TOPIC_LIMIT)
                    .cloned()
                    .collect(),
                preferences: record.preferences.clone(),
            },
        }
    }

    /// Entire log (unbounded `k`); this is the extraction pipeline's input.
    pub fn full(record: &MemoryRecord, entries: &[TranscriptEntry]) -> ContextWindow {
        Self::build(record, entries, entries.len())
    }
}
