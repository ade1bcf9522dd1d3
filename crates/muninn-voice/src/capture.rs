//! **Capture primitive**: the next recognized utterance within a bounded timeout.
//!
//! `listen` returns `Ok(None)` on timeout so the caller can re-check its stop
//! flag and loop; that timeout is the listener's sole suspension point.
//! Provider failures surface as `BackendError::Capture` and are the only error
//! class the listener retries.

use crate::error::{BackendError, BackendResult};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Backend returning the next recognized input event. Implement for a real
/// speech recognizer or any other utterance source.
pub trait CaptureBackend: Send + Sync {
    /// Wait up to `timeout` for the next utterance. `Ok(None)` means nothing
    /// was heard before the deadline; the caller decides whether to loop.
    fn listen(&self, timeout: Duration) -> BackendResult<Option<String>>;
}

/// One scripted step for [`ScriptedCapture`].
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// Return this text immediately.
    Text(String),
    /// Report a timeout (`Ok(None)`) immediately.
    Timeout,
    /// Fail with `BackendError::Capture`.
    Error(String),
}

/// Scripted capture: pops one step per `listen` call. Once the script is
/// exhausted it sleeps for the requested timeout and reports silence, which
/// keeps a listener loop honest about its cancellation check.
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    steps: Mutex<VecDeque<ScriptedStep>>,
}

impl ScriptedCapture {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
        }
    }

    /// Convenience: a script that returns each line in order, then silence.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            lines
                .into_iter()
                .map(|l| ScriptedStep::Text(l.into()))
                .collect(),
        )
    }

    /// Append a step to the end of the script.
    pub fn push(&self, step: ScriptedStep) {
        self.steps.lock().unwrap().push_back(step);
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

impl CaptureBackend for ScriptedCapture {
    fn listen(&self, timeout: Duration) -> BackendResult<Option<String>> {
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(ScriptedStep::Text(t)) => Ok(Some(t)),
            Some(ScriptedStep::Timeout) => Ok(None),
            Some(ScriptedStep::Error(e)) => Err(BackendError::Capture(e)),
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Line-based capture from standard input. A reader thread feeds a channel;
/// `listen` drains it with `recv_timeout`. EOF is reported as silence so the
/// session keeps running until the controller stops it.
pub struct StdinCapture {
    rx: Mutex<Receiver<String>>,
}

impl StdinCapture {
    /// Spawn the stdin reader thread and return the backend.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::stdin().read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        let trimmed = line.trim();
                        if !trimmed.is_empty() && tx.send(trimmed.to_string()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("stdin capture: read failed: {}", e);
                        break;
                    }
                }
            }
        });
        Self { rx: Mutex::new(rx) }
    }
}

impl CaptureBackend for StdinCapture {
    fn listen(&self, timeout: Duration) -> BackendResult<Option<String>> {
        let rx = self.rx.lock().unwrap();
        match rx.recv_timeout(timeout) {
            Ok(line) => Ok(Some(line)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}
