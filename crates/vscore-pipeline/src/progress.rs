//! Per-run progress channel.
//!
//! The sender enforces the stream rules: fractions never go backwards,
//! exactly one terminal event is delivered, and anything sent after it is
//! dropped. A receiver that has gone away turns sends into no-ops without
//! affecting the run.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use vscore_models::{clamp_fraction, ProgressEvent, ScoreReport};

#[derive(Debug, Default)]
struct StreamState {
    last_fraction: f64,
    terminated: bool,
}

/// Sending half of a run's progress stream.
#[derive(Clone)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    state: Arc<Mutex<StreamState>>,
}

impl ProgressSender {
    fn new(tx: Option<mpsc::UnboundedSender<ProgressEvent>>) -> Self {
        Self {
            tx,
            state: Arc::new(Mutex::new(StreamState::default())),
        }
    }

    /// Emit a progress update. Returns false if the event was dropped.
    pub fn progress(&self, message: impl Into<String>, fraction: f64) -> bool {
        self.send(ProgressEvent::progress(message, fraction))
    }

    /// Emit the terminal `complete` event.
    pub fn complete(&self, report: ScoreReport) -> bool {
        self.send(ProgressEvent::complete(report))
    }

    /// Emit the terminal `error` event at the current fraction.
    pub fn error(&self, message: impl Into<String>) -> bool {
        let fraction = self.last_fraction();
        self.send(ProgressEvent::error(message, fraction))
    }

    /// Highest fraction emitted so far.
    pub fn last_fraction(&self) -> f64 {
        self.lock().last_fraction
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    fn send(&self, mut event: ProgressEvent) -> bool {
        let mut state = self.lock();
        if state.terminated {
            return false;
        }

        event.fraction = clamp_fraction(event.fraction).max(state.last_fraction);
        state.last_fraction = event.fraction;
        if event.is_terminal() {
            state.terminated = true;
        }

        // Sent while holding the lock so clones cannot reorder events.
        match &self.tx {
            Some(tx) => tx.send(event).is_ok(),
            None => true,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Receiving half of a run's progress stream.
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Next event, or `None` once the run has finished and the stream closed.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Collect events up to and including the terminal one.
    pub async fn collect(mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }
}

/// Create a progress channel for one run.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender::new(Some(tx)), ProgressReceiver { rx })
}

/// A sender that tracks state but delivers nowhere.
pub fn noop_sender() -> ProgressSender {
    ProgressSender::new(None)
}
