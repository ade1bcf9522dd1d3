//! Thread-safe, append-only transcript log.
//!
//! Single writer (the listener), many readers (controller + extraction).
//! Sequence numbers are assigned together with the insertion under the write
//! lock, so a snapshot is always gap-free and duplicate-free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// One captured utterance. `sequence` starts at 1 and is never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// Append-only event store backing a capture session.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    entries: RwLock<Vec<TranscriptEntry>>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one utterance; returns its sequence number. The entry is visible
    /// to every `snapshot` that starts after this call returns.
    pub fn append(&self, text: impl Into<String>) -> u64 {
        self.push(text.into()).sequence
    }

    pub(crate) fn push(&self, text: String) -> TranscriptEntry {
        let mut entries = self.entries.write().unwrap();
        let entry = TranscriptEntry {
            sequence: entries.len() as u64 + 1,
            timestamp: Utc::now(),
            text,
        };
        entries.push(entry.clone());
        entry
    }

    /// Point-in-time copy in sequence order. Concurrent appends neither block
    /// on this nor corrupt the returned copy.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn assert_gap_free(entries: &[TranscriptEntry]) {
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, i as u64 + 1);
        }
    }

    #[test]
    fn append_assigns_increasing_sequences() {
        let log = TranscriptLog::new();
        assert_eq!(log.append("one"), 1);
        assert_eq!(log.append("two"), 2);
        assert_eq!(log.append("three"), 3);
        let snap = log.snapshot();
        assert_eq!(snap.len(), 3);
        assert_gap_free(&snap);
        assert_eq!(snap[1].text, "two");
    }

    #[test]
    fn concurrent_appends_stay_gap_free() {
        let log = Arc::new(TranscriptLog::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    log.append(format!("t{}-{}", t, i));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let snap = log.snapshot();
        assert_eq!(snap.len(), 200);
        assert_gap_free(&snap);
    }

    #[test]
    fn snapshot_during_appends_is_consistent() {
        let log = Arc::new(TranscriptLog::new());
        let writer = {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..500 {
                    log.append(format!("entry {}", i));
                }
            })
        };
        for _ in 0..50 {
            let snap = log.snapshot();
            assert_gap_free(&snap);
        }
        writer.join().unwrap();
        assert_eq!(log.len(), 500);
    }
}
