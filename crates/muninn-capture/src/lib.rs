//! # Muninn Capture - Live Capture Sessions
//!
//! The recurring subsystem behind the conversational front-ends: a capture
//! session runs a background listener concurrently with a controlling thread,
//! accumulates an ordered transcript, and on stop derives structured artifacts
//! (summary, action items, participants) while merging durable facts into a
//! bounded long-term memory.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Recorder                             │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐  │
//! │  │CaptureSession │ → │ TranscriptLog │ → │  Extraction   │  │
//! │  │ (listener)    │   │ (seq, append) │   │  Pipeline     │  │
//! │  └───────────────┘   └───────┬───────┘   └───────┬───────┘  │
//! │                              ↓                   ↓          │
//! │                   ┌───────────────┐   ┌───────────────┐     │
//! │                   │ContextWindow  │   │ MemoryStore + │     │
//! │                   │Builder        │   │ StateFile     │     │
//! │                   └───────────────┘   └───────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod extraction;
pub mod heuristics;
pub mod memory;
pub mod persistence;
pub mod recorder;
pub mod session;
pub mod transcript;

pub use command::{Command, CommandTable};
pub use config::{CaptureConfig, UserConfig};
pub use context::{ContextWindow, ContextWindowBuilder, ProfileSnippet};
pub use error::{ControlError, PersistenceError};
pub use extraction::{ExtractionField, ExtractionPipeline, ExtractionResult};
pub use memory::{MemoryRecord, MemoryStore, MemoryUpdate};
pub use persistence::{ArchiveStats, PersistedState, SessionRecord, StateFile};
pub use recorder::{Recorder, SessionOutcome};
pub use session::{CaptureSession, SessionReport, SessionState};
pub use transcript::{TranscriptEntry, TranscriptLog};
