//! Capture session state machine and the background listener thread.
//!
//! One lightweight listener per session, cancelled cooperatively: the thread
//! observes an `AtomicBool` once per loop iteration, and its only suspension
//! point is the bounded-timeout `listen` call. `stop()` is a blocking join:
//! it never returns with the listener still running, and a stopped session is
//! terminal.

use crate::error::ControlError;
use crate::transcript::{TranscriptEntry, TranscriptLog};
use chrono::{DateTime, Utc};
use muninn_voice::CaptureBackend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Consecutive capture errors before the session latches the degraded notice.
pub const DEGRADED_THRESHOLD: u32 = 3;

/// Session lifecycle. `Stopped` is terminal; record again with a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
    Stopped,
}

/// Immutable result of a stopped session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub transcript: Vec<TranscriptEntry>,
    /// True when the capture backend was degraded (3+ consecutive errors) at stop.
    pub degraded: bool,
}

/// One capture run: owns the listener thread's lifetime and the transcript log.
pub struct CaptureSession {
    id: String,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    log: Arc<TranscriptLog>,
    stop_flag: Arc<AtomicBool>,
    degraded: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    listen_timeout: Duration,
    entry_tx: Option<mpsc::UnboundedSender<TranscriptEntry>>,
    entry_rx: Option<mpsc::UnboundedReceiver<TranscriptEntry>>,
}

impl CaptureSession {
    /// Create an idle session. `listen_timeout` bounds each capture call and
    /// therefore how long `stop()` can block on the join.
    pub fn new(listen_timeout: Duration) -> Self {
        let (entry_tx, entry_rx) = mpsc::unbounded_channel();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::Idle,
            started_at: None,
            log: Arc::new(TranscriptLog::new()),
            stop_flag: Arc::new(AtomicBool::new(false)),
            degraded: Arc::new(AtomicBool::new(false)),
            listener: None,
            listen_timeout,
            entry_tx: Some(entry_tx),
            entry_rx: Some(entry_rx),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Shared handle to the transcript log; safe to read while recording.
    pub fn log(&self) -> Arc<TranscriptLog> {
        Arc::clone(&self.log)
    }

    /// Live feed of appended entries. Can be taken once.
    pub fn take_entry_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<TranscriptEntry>> {
        self.entry_rx.take()
    }

    /// Non-fatal notice: capture has failed `DEGRADED_THRESHOLD` times in a
    /// row. Recording continues; the flag clears when capture succeeds again.
    pub fn degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Spawn the listener and transition to `Recording`. Valid only from `Idle`;
    /// failed calls mutate nothing.
    pub fn start(&mut self, backend: Arc<dyn CaptureBackend>) -> Result<(), ControlError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Recording => return Err(ControlError::AlreadyRecording),
            SessionState::Stopping | SessionState::Stopped => {
                return Err(ControlError::SessionStopped)
            }
        }

        self.started_at = Some(Utc::now());
        let log = Arc::clone(&self.log);
        let stop_flag = Arc::clone(&self.stop_flag);
        let degraded = Arc::clone(&self.degraded);
        let timeout = self.listen_timeout;
        let entry_tx = self.entry_tx.take();
        let session_id = self.id.clone();

        self.listener = Some(thread::spawn(move || {
            listener_loop(backend, log, stop_flag, degraded, timeout, entry_tx);
            debug!("session {}: listener exited", session_id);
        }));
        self.state = SessionState::Recording;
        info!("session {}: recording started", self.id);
        Ok(())
    }

    /// Signal cancellation, join the listener, and retire the session. Valid
    /// only from `Recording`. Blocks until the listener has fully exited
    /// (bounded by the listen timeout granularity).
    pub fn stop(&mut self) -> Result<SessionReport, ControlError> {
        match self.state {
            SessionState::Recording => {}
            SessionState::Idle => return Err(ControlError::NotRecording),
            SessionState::Stopping | SessionState::Stopped => {
                return Err(ControlError::SessionStopped)
            }
        }

        self.state = SessionState::Stopping;
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
        }
        self.state = SessionState::Stopped;

        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let duration = (Utc::now() - started_at).to_std().unwrap_or_default();
        let transcript = self.log.snapshot();
        info!(
            "session {}: stopped after {:.1}s with {} entries",
            self.id,
            duration.as_secs_f64(),
            transcript.len()
        );
        Ok(SessionReport {
            id: self.id.clone(),
            started_at,
            duration,
            transcript,
            degraded: self.degraded.load(Ordering::Relaxed),
        })
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
        }
    }
}

/// Listener loop: capture with a bounded timeout, append on text, re-check the
/// stop flag on every iteration. Only capture-primitive errors are retried;
/// three in a row latch the degraded notice without stopping the session.
fn listener_loop(
    backend: Arc<dyn CaptureBackend>,
    log: Arc<TranscriptLog>,
    stop_flag: Arc<AtomicBool>,
    degraded: Arc<AtomicBool>,
    timeout: Duration,
    entry_tx: Option<mpsc::UnboundedSender<TranscriptEntry>>,
) {
    let mut consecutive_errors = 0u32;
    while !stop_flag.load(Ordering::Relaxed) {
        match backend.listen(timeout) {
            Ok(Some(text)) => {
                consecutive_errors = 0;
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                degraded.store(false, Ordering::Relaxed);
                let entry = log.push(text);
                debug!("[{}] {}", entry.sequence, entry.text);
                if let Some(ref tx) = entry_tx {
                    let _ = tx.send(entry);
                }
            }
            Ok(None) => {
                // Timeout: nothing heard, loop re-checks cancellation.
                consecutive_errors = 0;
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!("capture error ({} in a row): {}", consecutive_errors, e);
                if consecutive_errors >= DEGRADED_THRESHOLD
                    && !degraded.swap(true, Ordering::Relaxed)
                {
                    warn!(
                        "capture degraded after {} consecutive errors; recording continues",
                        consecutive_errors
                    );
                }
            }
        }
    }
}
