//! Recovery run history.
//!
//! Provides immutable tracking of the transitions taken during one run,
//! following functional programming principles. History lives only as
//! long as the run's outcome; nothing here is persisted.

use super::state::StateName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use nzsf::core::{StateName, StateTransition};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let transition = StateTransition {
///     from: StateName::new("follow_off"),
///     to: StateName::new("rec_error"),
///     timestamp: Utc::now(),
///     waited: Duration::from_secs(91),
///     error_path: true,
/// };
/// assert!(transition.error_path);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being transitioned from
    pub from: StateName,
    /// The state being transitioned to
    pub to: StateName,
    /// When the transition fired
    pub timestamp: DateTime<Utc>,
    /// Time spent polling the source state's table before it fired
    pub waited: Duration,
    /// Whether the accepted transition was an error-path escalation
    pub error_path: bool,
}

/// Ordered history of state transitions.
///
/// History is immutable - the `record` method returns a new history
/// with the transition added.
///
/// # Example
///
/// ```rust
/// use nzsf::core::{RecoveryHistory, StateName, StateTransition};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let step = |from: &str, to: &str| StateTransition {
///     from: StateName::new(from),
///     to: StateName::new(to),
///     timestamp: Utc::now(),
///     waited: Duration::ZERO,
///     error_path: false,
/// };
///
/// let history = RecoveryHistory::new()
///     .record(step("start", "clear_nzsf"))
///     .record(step("clear_nzsf", "fault_cleared"));
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // start -> clear_nzsf -> fault_cleared
/// assert_eq!(path[0], &StateName::new("start"));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecoveryHistory {
    transitions: Vec<StateTransition>,
}

impl RecoveryHistory {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// This is a pure function - it does not mutate the existing history
    /// but returns a new one with the transition added.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Get the path of states traversed.
    ///
    /// Returns references to states in order: the first source state, then
    /// the `to` state of each transition.
    pub fn get_path(&self) -> Vec<&StateName> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate total duration from first to last transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Sum of the time spent polling across all recorded transitions.
    pub fn time_waited(&self) -> Duration {
        self.transitions.iter().map(|t| t.waited).sum()
    }

    /// Transitions accepted through the error-path timeout.
    pub fn escalations(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter().filter(|t| t.error_path)
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }
}
