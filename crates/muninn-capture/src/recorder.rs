//! High-level controller: owns memory and persistence, drives capture runs and
//! direct message exchanges.
//!
//! A session always yields its transcript and a complete (possibly
//! partially-sentinel) extraction result, even under provider outages;
//! captured data is never discarded because a downstream step failed.

use crate::config::CaptureConfig;
use crate::context::{ContextWindow, ContextWindowBuilder};
use crate::error::{ControlError, PersistenceError};
use crate::extraction::{ExtractionPipeline, ExtractionResult};
use crate::heuristics;
use crate::memory::{MemoryRecord, MemoryStore};
use crate::persistence::{ArchiveStats, PersistedState, SessionRecord, StateFile};
use crate::session::{CaptureSession, SessionReport};
use crate::transcript::TranscriptLog;
use muninn_voice::{CaptureBackend, GenerationBackend};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a finished capture run produced. `persistence` is `Some(error)`
/// when the flush failed; the in-memory state is retained so `save()` can be
/// retried losslessly.
pub struct SessionOutcome {
    pub report: SessionReport,
    pub extraction: ExtractionResult,
    pub persistence: Option<PersistenceError>,
}

/// Controller for capture runs and chat exchanges against one state file.
pub struct Recorder {
    config: CaptureConfig,
    memory: MemoryStore,
    state_file: StateFile,
    state: PersistedState,
    generation: Arc<dyn GenerationBackend>,
}

impl Recorder {
    /// Load the persisted envelope and mirror its memory records.
    pub fn open(
        config: CaptureConfig,
        state_file: StateFile,
        generation: Arc<dyn GenerationBackend>,
    ) -> Result<Self, PersistenceError> {
        let state = state_file.load()?;
        let memory = MemoryStore::new(config.topic_cap);
        memory.load_from(&state.memories);
        info!(
            "recorder opened: {} sessions, {} identities",
            state.sessions.len(),
            state.memories.len()
        );
        Ok(Self {
            config,
            memory,
            state_file,
            state,
            generation,
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Create a session and start its listener.
    pub fn begin(&self, backend: Arc<dyn CaptureBackend>) -> Result<CaptureSession, ControlError> {
        let mut session = CaptureSession::new(self.config.listen_timeout);
        session.start(backend)?;
        Ok(session)
    }

    /// Live context for per-turn prompting: last K turns plus the identity's
    /// profile. Never blocks the listener.
    pub fn context(&self, identity: &str, log: &TranscriptLog) -> ContextWindow {
        ContextWindowBuilder::build(
            &self.memory.get(identity),
            &log.snapshot(),
            self.config.context_turns,
        )
    }

    /// Stop the session, derive artifacts, merge durable facts, and flush.
    pub fn finish(
        &mut self,
        identity: &str,
        title: &str,
        session: &mut CaptureSession,
    ) -> Result<SessionOutcome, ControlError> {
        let report = session.stop()?;

        let extraction = ExtractionPipeline::new(Arc::clone(&self.generation)).run(&report.transcript);

        for entry in &report.transcript {
            let update = heuristics::update_from_message(&entry.text, self.config.topic_min_len);
            if !update.is_empty() {
                self.memory.merge(identity, &update);
            }
        }

        self.state.sessions.push(SessionRecord {
            id: report.id.clone(),
            title: title.to_string(),
            started_at: Some(report.started_at),
            duration_secs: report.duration.as_secs_f64(),
            transcript: report.transcript.clone(),
            extraction: Some(extraction.clone()),
        });
        self.state.memories = self.memory.export();

        let persistence = match self.state_file.save(&self.state) {
            Ok(()) => None,
            Err(e) => {
                warn!("state flush failed (retry with save()): {}", e);
                Some(e)
            }
        };

        Ok(SessionOutcome {
            report,
            extraction,
            persistence,
        })
    }

    /// One chat exchange: merge heuristics into memory, prompt with a bounded
    /// context window, append the utterance to the log. A generation failure
    /// comes back as an apology string, never a crash.
    pub fn process_message(&mut self, identity: &str, log: &TranscriptLog, input: &str) -> String {
        let update = heuristics::update_from_message(input, self.config.topic_min_len);
        let record = self.memory.merge(identity, &update);

        let window = ContextWindowBuilder::build(&record, &log.snapshot(), self.config.context_turns);
        log.append(input);

        let response = match self.generation.generate(&window.render_prompt(input)) {
            Ok(text) => text,
            Err(e) => {
                warn!("generation failed for chat exchange: {}", e);
                format!("Sorry, I encountered an error: {}", e)
            }
        };

        self.state.memories = self.memory.export();
        if let Err(e) = self.state_file.save(&self.state) {
            warn!("memory flush failed (retry with save()): {}", e);
        }
        response
    }

    /// Retry the flush after a failed save; in-memory state was kept as-is.
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.state_file.save(&self.state)
    }

    /// Current record for the identity.
    pub fn memory(&self, identity: &str) -> MemoryRecord {
        self.memory.get(identity)
    }

    /// Replace the identity's memory with a fresh empty record and flush.
    pub fn reset_memory(&mut self, identity: &str) -> Result<(), PersistenceError> {
        self.memory.reset(identity);
        self.state.memories = self.memory.export();
        self.state_file.save(&self.state)
    }

    pub fn search(&self, query: &str) -> Vec<&SessionRecord> {
        self.state.search(query)
    }

    pub fn stats(&self) -> ArchiveStats {
        self.state.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muninn_voice::{PlaceholderGeneration, ScriptedCapture};
    use std::time::Duration;

    fn test_recorder(dir: &std::path::Path) -> Recorder {
        let config = CaptureConfig {
            listen_timeout: Duration::from_millis(5),
            ..CaptureConfig::default()
        };
        Recorder::open(
            config,
            StateFile::new(dir.join("state.json")),
            Arc::new(PlaceholderGeneration::new()),
        )
        .unwrap()
    }

    fn wait_for_len(log: &TranscriptLog, n: usize) {
        for _ in 0..200 {
            if log.len() >= n {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("log never reached {} entries", n);
    }

    #[test]
    fn full_capture_run_persists_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = test_recorder(dir.path());

        let backend = Arc::new(ScriptedCapture::from_lines([
            "hello",
            "my name is Bob and I work on reports",
            "action: Bob send report by Friday",
        ]));
        let mut session = recorder.begin(backend).unwrap();
        wait_for_len(&session.log(), 3);

        let outcome = recorder.finish("default", "Standup", &mut session).unwrap();
        assert!(outcome.persistence.is_none());
        assert_eq!(outcome.report.transcript.len(), 3);
        assert!(outcome.extraction.fully_populated());

        // Durable facts were merged and flushed.
        let record = recorder.memory("default");
        assert_eq!(record.name.as_deref(), Some("Bob"));
        assert!(record.topics.contains(&"report".to_string()));

        let reloaded = StateFile::new(dir.path().join("state.json")).load().unwrap();
        assert_eq!(reloaded.sessions.len(), 1);
        assert_eq!(reloaded.sessions[0].title, "Standup");
        assert_eq!(reloaded.memories["default"].name.as_deref(), Some("Bob"));
    }

    #[test]
    fn process_message_merges_and_responds() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = test_recorder(dir.path());
        let log = TranscriptLog::new();

        let response = recorder.process_message("u1", &log, "my name is Ada and I like compilers");
        assert!(!response.is_empty());
        assert_eq!(log.len(), 1);
        assert_eq!(recorder.memory("u1").name.as_deref(), Some("Ada"));

        // Later candidates never overwrite the name.
        recorder.process_message("u1", &log, "my name is Grace");
        assert_eq!(recorder.memory("u1").name.as_deref(), Some("Ada"));
    }

    #[test]
    fn context_uses_configured_window() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = test_recorder(dir.path());
        let log = TranscriptLog::new();
        for i in 0..6 {
            log.append(format!("turn {}", i));
        }
        let window = recorder.context("u1", &log);
        assert_eq!(window.turns.len(), recorder.config().context_turns);
        assert_eq!(window.turns.last().unwrap().text, "turn 5");
    }

    #[test]
    fn reset_memory_forgets_the_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = test_recorder(dir.path());
        let log = TranscriptLog::new();
        recorder.process_message("u1", &log, "my name is Ada");
        recorder.reset_memory("u1").unwrap();
        assert_eq!(recorder.memory("u1"), MemoryRecord::default());

        let reloaded = StateFile::new(dir.path().join("state.json")).load().unwrap();
        assert_eq!(reloaded.memories["u1"], MemoryRecord::default());
    }
}
