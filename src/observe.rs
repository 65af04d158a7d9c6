//! Run events and the sinks that receive them.
//!
//! The run loop reports every state entry, every fired transition message
//! and the terminal state through an [`Observer`]. Events are emitted
//! synchronously from the loop, so a sink sees them in run order.

use crate::core::StateName;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Something worth reporting while a recovery runs.
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    /// The machine moved into a state, terminal states included.
    Entered(StateName),

    /// Free-form message from a handler or a fired transition.
    Message(String),

    /// A handler's effect failed; the run continues.
    HandlerFailed { state: StateName, reason: String },

    /// The run stopped, normally on a terminal state. Always the last
    /// event of a run.
    Ended(StateName),
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entered(state) => write!(f, "Recovery in {} state", state.upper()),
            Self::Message(message) => f.write_str(message),
            Self::HandlerFailed { state, reason } => {
                write!(f, "Handler for {} failed: {reason}", state.upper())
            }
            Self::Ended(state) => write!(f, "Recovery ended on {}", state.upper()),
        }
    }
}

/// Sink for run events. Fire-and-forget.
pub trait Observer: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn emit(&self, event: &RunEvent) {
        match event {
            RunEvent::Entered(state) => tracing::info!(state = %state, "{event}"),
            RunEvent::Message(_) => tracing::info!("{event}"),
            RunEvent::HandlerFailed { state, reason } => {
                tracing::warn!(state = %state, reason = %reason, "handler failed")
            }
            RunEvent::Ended(state) => tracing::info!(state = %state, "{event}"),
        }
    }
}

/// Keeps every event in memory, in emission order.
///
/// Clones share the same buffer, so a clone handed to the machine can be
/// inspected afterwards.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Rendered form of every event.
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl Observer for RecordingObserver {
    fn emit(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
