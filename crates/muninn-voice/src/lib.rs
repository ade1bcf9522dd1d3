//! # Muninn Voice - Boundary Primitives
//!
//! The capture layer (`muninn-capture`) is written against three traits that
//! wrap the opaque external capabilities:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      muninn-capture                        │
//! │  ┌──────────────┐  ┌───────────────┐  ┌───────────────┐   │
//! │  │   Listener   │  │  Extraction   │  │   Recorder    │   │
//! │  └──────┬───────┘  └──────┬────────┘  └──────┬────────┘   │
//! └─────────┼─────────────────┼──────────────────┼────────────┘
//!           ↓                 ↓                  ↓
//!   CaptureBackend    GenerationBackend   SynthesisBackend
//!   (next utterance    (prompt → text      (fire-and-forget
//!    within timeout)    completion)         speech output)
//! ```
//!
//! Production implementations talk to OpenAI-compatible HTTP APIs with an
//! explicit [`ProviderConfig`] (no ambient provider state); scripted and
//! placeholder implementations drive the test suite and the offline CLI.

pub mod capture;
pub mod error;
pub mod generation;
pub mod synthesis;

pub use capture::{CaptureBackend, ScriptedCapture, ScriptedStep, StdinCapture};
pub use error::{BackendError, BackendResult};
pub use generation::{ChatClient, GenerationBackend, PlaceholderGeneration, ProviderConfig};
pub use synthesis::{ConsoleSynthesis, NullSynthesis, SynthesisBackend};
