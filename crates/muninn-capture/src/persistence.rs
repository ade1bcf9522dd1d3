//! Crash-safe JSON persistence for sessions and memory.
//!
//! The file is the sole source of truth; in-memory copies are read-through
//! mirrors until the next flush. Saves go through a temporary file in the same
//! directory followed by an atomic rename, so readers never observe a
//! partially written state.

use crate::error::PersistenceError;
use crate::extraction::ExtractionResult;
use crate::memory::MemoryRecord;
use crate::transcript::TranscriptEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// The retired, immutable form of one capture session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionRecord {
    pub id: String,
    pub title: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub transcript: Vec<TranscriptEntry>,
    pub extraction: Option<ExtractionResult>,
}

/// Aggregate figures over the archive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveStats {
    pub sessions: usize,
    pub total_duration_secs: f64,
    pub total_entries: usize,
}

/// The durable envelope: retired sessions plus one memory record per identity.
/// Every field defaults, so additive schema changes never break older files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersistedState {
    pub sessions: Vec<SessionRecord>,
    pub memories: BTreeMap<String, MemoryRecord>,
}

impl PersistedState {
    /// Case-insensitive substring search over title, summary, and transcript.
    pub fn search(&self, query: &str) -> Vec<&SessionRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.sessions
            .iter()
            .filter(|s| {
                if s.title.to_lowercase().contains(&query) {
                    return true;
                }
                if let Some(summary) = s
                    .extraction
                    .as_ref()
                    .and_then(|e| e.summary.value())
                {
                    if summary.to_lowercase().contains(&query) {
                        return true;
                    }
                }
                s.transcript
                    .iter()
                    .any(|e| e.text.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn stats(&self) -> ArchiveStats {
        ArchiveStats {
            sessions: self.sessions.len(),
            total_duration_secs: self.sessions.iter().map(|s| s.duration_secs).sum(),
            total_entries: self.sessions.iter().map(|s| s.transcript.len()).sum(),
        }
    }
}

/// One persisted state file. Writes through this handle are serialized, so a
/// path never sees concurrent writers.
pub struct StateFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default path: `MUNINN_STORAGE_PATH` or `./data`, then `muninn/state.json`.
    pub fn default_path() -> PathBuf {
        let base = std::env::var("MUNINN_STORAGE_PATH").unwrap_or_else(|_| "./data".to_string());
        PathBuf::from(base).join("muninn").join("state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the envelope. A missing file is a fresh default state, not an
    /// error; unknown fields in a present file are ignored and missing ones
    /// take their defaults.
    pub fn load(&self) -> Result<PersistedState, PersistenceError> {
        if !self.path.exists() {
            debug!("state file {} missing; starting fresh", self.path.display());
            return Ok(PersistedState::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(PersistedState::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a temporary file, then atomically replace the target. An
    /// interruption between the two steps leaves the prior valid file intact.
    pub fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().unwrap();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        info!(
            "state saved: {} sessions, {} identities → {}",
            state.sessions.len(),
            state.memories.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionField;

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::default();
        state.sessions.push(SessionRecord {
            id: "s1".to_string(),
            title: "Planning".to_string(),
            started_at: Some(Utc::now()),
            duration_secs: 12.5,
            transcript: vec![
                TranscriptEntry {
                    sequence: 1,
                    timestamp: Utc::now(),
                    text: "hello".to_string(),
                },
                TranscriptEntry {
                    sequence: 2,
                    timestamp: Utc::now(),
                    text: "action: Bob send report by Friday".to_string(),
                },
            ],
            extraction: Some(ExtractionResult {
                summary: ExtractionField::Value("a short summary".to_string()),
                action_items: ExtractionField::Value("Bob: report".to_string()),
                participants: ExtractionField::Failed {
                    reason: "outage".to_string(),
                },
            }),
        });
        let mut record = MemoryRecord::default();
        record.name = Some("Ada".to_string());
        record.facts = vec!["I like rust".to_string(), "I work remotely".to_string()];
        record.topics = vec!["rust".to_string(), "remote".to_string()];
        state.memories.insert("default".to_string(), record);
        state
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("nope.json"));
        assert_eq!(file.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn save_load_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        let state = sample_state();
        file.save(&state).unwrap();
        let loaded = file.load().unwrap();
        assert_eq!(loaded, state);
        // List ordering survives explicitly.
        assert_eq!(loaded.sessions[0].transcript[0].text, "hello");
        assert_eq!(
            loaded.memories["default"].facts,
            vec!["I like rust", "I work remotely"]
        );
    }

    #[test]
    fn unknown_and_missing_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"sessions":[{"id":"s1","future_field":42}],"added_later":true}"#,
        )
        .unwrap();
        let loaded = StateFile::new(&path).load().unwrap();
        assert_eq!(loaded.sessions.len(), 1);
        assert_eq!(loaded.sessions[0].id, "s1");
        assert_eq!(loaded.sessions[0].duration_secs, 0.0);
        assert!(loaded.memories.is_empty());
    }

    #[test]
    fn interrupted_save_leaves_prior_state_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let file = StateFile::new(&path);
        let state = sample_state();
        file.save(&state).unwrap();

        // Simulate dying after the temporary write, before the rename.
        fs::write(path.with_file_name("state.json.tmp"), "{\"sessions\": [truncated").unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn search_matches_title_summary_and_transcript() {
        let state = sample_state();
        assert_eq!(state.search("planning").len(), 1);
        assert_eq!(state.search("short summary").len(), 1);
        assert_eq!(state.search("friday").len(), 1);
        assert!(state.search("absent").is_empty());
        assert!(state.search("").is_empty());
    }

    #[test]
    fn stats_aggregate_sessions() {
        let mut state = sample_state();
        state.sessions.push(SessionRecord {
            duration_secs: 7.5,
            ..SessionRecord::default()
        });
        let stats = state.stats();
        assert_eq!(stats.sessions, 2);
        assert!((stats.total_duration_secs - 20.0).abs() < 1e-9);
        assert_eq!(stats.total_entries, 2);
    }
}
