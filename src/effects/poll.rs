//! Per-state polling with error-path escalation.

use crate::core::StateName;
use crate::effects::context::{ExecutionContext, PointIo};
use crate::effects::state::State;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default time a state may wait before error-path transitions become
/// acceptable.
pub const DEFAULT_ERROR_TIMEOUT: Duration = Duration::from_secs(90);

/// Default back-off between scans of a transition table.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Transition accepted by the poller.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub target: StateName,
    pub waited: Duration,
    pub error_path: bool,
    pub message: Option<String>,
}

/// Repeatedly scans a state's transition table against fresh snapshots
/// until an acceptable transition fires.
///
/// A candidate is accepted when it is not an error-path transition, or
/// when more than `error_timeout` has passed since polling began. The
/// timeout is per state and measured from the first scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionPoller {
    pub error_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for TransitionPoller {
    fn default() -> Self {
        Self {
            error_timeout: DEFAULT_ERROR_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TransitionPoller {
    pub fn new(error_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            error_timeout,
            poll_interval,
        }
    }

    /// Poll `state`'s table until a transition is accepted.
    ///
    /// Never returns if no guard ever fires; validated machines end every
    /// table with an unconditional fallback, which bounds the wait by the
    /// error timeout.
    pub async fn next_state<P: PointIo>(
        &self,
        state: &State<P>,
        ctx: &ExecutionContext<P>,
    ) -> Decision {
        let started = Instant::now();
        let mut pending_escalation: Option<&StateName> = None;

        loop {
            let snapshot = ctx.snapshot();
            let candidate = state.transitions().first_match(&snapshot);
            let waited = started.elapsed();

            if let Some(transition) = candidate {
                if !transition.is_error_path() || waited > self.error_timeout {
                    if transition.is_error_path() {
                        tracing::warn!(
                            state = %state.name(),
                            target = %transition.target,
                            waited_ms = whole_millis(waited),
                            "error timeout elapsed, escalating"
                        );
                    }
                    return Decision {
                        target: transition.target.clone(),
                        waited,
                        error_path: transition.is_error_path(),
                        message: transition.message.clone(),
                    };
                }

                if pending_escalation != Some(&transition.target) {
                    tracing::debug!(
                        state = %state.name(),
                        target = %transition.target,
                        "waiting on error-path candidate"
                    );
                    pending_escalation = Some(&transition.target);
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}

/// Milliseconds in `duration`, saturating at `u64::MAX`.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
