//! **Synthesis primitive**: fire-and-forget speech output.
//!
//! Synthesis failures are not part of core correctness; callers log and move
//! on. Real audio output lives behind this trait in a front-end crate.

use crate::error::BackendResult;
use tracing::debug;

/// Backend that renders text as speech (or any other output channel).
pub trait SynthesisBackend: Send + Sync {
    /// Speak the given text. Errors are advisory; callers must not abort on them.
    fn speak(&self, text: &str) -> BackendResult<()>;
}

/// Discards all output. Use in tests and headless runs.
#[derive(Debug, Default)]
pub struct NullSynthesis;

impl SynthesisBackend for NullSynthesis {
    fn speak(&self, text: &str) -> BackendResult<()> {
        debug!("synthesis (null): {}", text);
        Ok(())
    }
}

/// Prints the line to stdout, prefixed so it reads as spoken output.
#[derive(Debug, Default)]
pub struct ConsoleSynthesis;

impl SynthesisBackend for ConsoleSynthesis {
    fn speak(&self, text: &str) -> BackendResult<()> {
        let text = text.trim();
        if !text.is_empty() {
            println!("🔊 {}", text);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_synthesis_accepts_anything() {
        let tts = NullSynthesis;
        assert!(tts.speak("hello").is_ok());
        assert!(tts.speak("").is_ok());
    }
}
