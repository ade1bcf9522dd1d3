//! Bounded, deduplicated long-term memory, one record per identity.
//!
//! The store only merges pre-extracted candidates; text heuristics live in
//! [`crate::heuristics`] with the callers. Records are read-through mirrors of
//! the persisted envelope until the next flush.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Default cap on the `topics` list; oldest entries are evicted first.
pub const DEFAULT_TOPIC_CAP: usize = 50;

/// Durable facts about one identity. `name`, once set, is never overwritten by
/// later inference (first-writer-wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryRecord {
    pub name: Option<String>,
    pub preferences: BTreeMap<String, String>,
    /// Deduplicated by exact value; insertion order preserved.
    pub facts: Vec<String>,
    /// Deduplicated, bounded; oldest evicted first when over the cap.
    pub topics: Vec<String>,
    pub last_interaction: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    /// Apply one set of pre-extracted candidates. Idempotent: merging the same
    /// update twice from the same starting state yields the same facts, topics,
    /// and name as merging it once.
    pub fn merge(&mut self, update: &MemoryUpdate, topic_cap: usize) {
        if self.name.is_none() {
            if let Some(ref candidate) = update.name {
                self.name = Some(candidate.clone());
            }
        }
        for fact in &update.facts {
            if !self.facts.contains(fact) {
                self.facts.push(fact.clone());
            }
        }
        for topic in &update.topics {
            if !self.topics.contains(topic) {
                self.topics.push(topic.clone());
            }
        }
        while self.topics.len() > topic_cap {
            self.topics.remove(0);
        }
        self.last_interaction = Some(Utc::now());
    }
}

/// Pre-extracted merge candidates (see [`crate::heuristics`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryUpdate {
    pub name: Option<String>,
    pub facts: Vec<String>,
    pub topics: Vec<String>,
}

impl MemoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.facts.is_empty() && self.topics.is_empty()
    }
}

/// Per-identity record map. A record is created empty on first use and only
/// replaced by an explicit `reset`.
pub struct MemoryStore {
    records: DashMap<String, MemoryRecord>,
    topic_cap: usize,
}

impl MemoryStore {
    pub fn new(topic_cap: usize) -> Self {
        Self {
            records: DashMap::new(),
            topic_cap,
        }
    }

    pub fn topic_cap(&self) -> usize {
        self.topic_cap
    }

    /// Current record for the identity (created empty on first use).
    pub fn get(&self, identity: &str) -> MemoryRecord {
        self.records
            .entry(identity.to_string())
            .or_default()
            .clone()
    }

    /// Merge candidates into the identity's record; returns the merged copy.
    pub fn merge(&self, identity: &str, update: &MemoryUpdate) -> MemoryRecord {
        let mut entry = self.records.entry(identity.to_string()).or_default();
        entry.merge(update, self.topic_cap);
        entry.clone()
    }

    /// Replace the identity's record with a fresh empty one.
    pub fn reset(&self, identity: &str) {
        self.records
            .insert(identity.to_string(), MemoryRecord::default());
        info!("memory reset for identity '{}'", identity);
    }

    /// Seed the store from a persisted envelope (mirror refresh).
    pub fn load_from(&self, memories: &BTreeMap<String, MemoryRecord>) {
        for (identity, record) in memories {
            self.records.insert(identity.clone(), record.clone());
        }
    }

    /// Export every record for persistence, in stable identity order.
    pub fn export(&self) -> BTreeMap<String, MemoryRecord> {
        self.records
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAP)
    }
}
