//! State machine that drives a recovery from its start state to a
//! terminal state.

use crate::core::{RecoveryHistory, StateName, StateTransition};
use crate::effects::context::{ExecutionContext, PointIo};
use crate::effects::poll::{Decision, TransitionPoller};
use crate::effects::state::State;
use crate::observe::RunEvent;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::fmt;
use stillwater::prelude::*;
use tokio::time::sleep;

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct RecoveryOutcome {
    pub terminal: StateName,
    pub history: RecoveryHistory,
}

impl RecoveryOutcome {
    pub fn ended_on(&self, name: &str) -> bool {
        self.terminal.matches(name)
    }
}

/// Validated set of states plus the engine settings used to run them.
///
/// Machines are only produced by
/// [`StateMachineBuilder`](crate::builder::StateMachineBuilder), which
/// guarantees a single start state, at least one terminal state and
/// resolvable transition targets. A machine runs once; [`StateMachine::run`]
/// consumes it.
pub struct StateMachine<P> {
    pub(crate) states: HashMap<StateName, State<P>>,
    pub(crate) order: Vec<StateName>,
    pub(crate) start: StateName,
    pub(crate) terminals: HashSet<StateName>,
    pub(crate) previous: StateName,
    pub(crate) poller: TransitionPoller,
}

impl<P: PointIo + Clone + 'static> StateMachine<P> {
    pub fn start_state(&self) -> &StateName {
        &self.start
    }

    pub fn terminal_states(&self) -> &HashSet<StateName> {
        &self.terminals
    }

    pub fn is_terminal(&self, name: &StateName) -> bool {
        self.terminals.contains(name)
    }

    /// The state visited before the current one.
    pub fn previous_state(&self) -> &StateName {
        &self.previous
    }

    pub fn state(&self, name: &str) -> Option<&State<P>> {
        self.states.get(&StateName::new(name))
    }

    /// States in registration order.
    pub fn states(&self) -> impl Iterator<Item = &State<P>> {
        self.order.iter().filter_map(|name| self.states.get(name))
    }

    pub fn poller(&self) -> TransitionPoller {
        self.poller
    }

    /// Run from the start state until a terminal state's handler has run.
    ///
    /// Each visit runs the state's handler, waits out its settle delay and
    /// then polls its transition table. Handler failures are reported and
    /// the run carries on; recovery from them is the job of the graph's
    /// error-path transitions.
    pub async fn run(mut self, ctx: &mut ExecutionContext<P>) -> RecoveryOutcome {
        let mut current = self.start.clone();
        self.previous = self.start.clone();
        let mut history = RecoveryHistory::new();

        tracing::info!(start = %current, "starting recovery");

        loop {
            let Some(state) = self.states.get(&current) else {
                // Targets are checked at build time, so this only trips on
                // a machine assembled by hand.
                tracing::error!(state = %current, "no such state, stopping");
                ctx.emit(RunEvent::Ended(current.clone()));
                return RecoveryOutcome {
                    terminal: current,
                    history,
                };
            };

            if let Err(error) = state.entry_effect().run(ctx).await {
                ctx.emit(RunEvent::HandlerFailed {
                    state: current.clone(),
                    reason: error.to_string(),
                });
            }

            if state.is_terminal() {
                ctx.emit(RunEvent::Ended(current.clone()));
                return RecoveryOutcome {
                    terminal: current,
                    history,
                };
            }

            if let Some(delay) = state.settle_delay() {
                sleep(delay).await;
            }

            let decision = self.poller.next_state(state, ctx).await;
            if let Some(message) = &decision.message {
                ctx.report(message.clone());
            }

            history = history.record(transition_record(&current, &decision));
            ctx.set_prev_state(current.clone());
            self.previous = std::mem::replace(&mut current, decision.target);

            ctx.emit(RunEvent::Entered(current.clone()));
        }
    }
}

fn transition_record(from: &StateName, decision: &Decision) -> StateTransition {
    StateTransition {
        from: from.clone(),
        to: decision.target.clone(),
        timestamp: Utc::now(),
        waited: decision.waited,
        error_path: decision.error_path,
    }
}

impl<P> fmt::Display for StateMachine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in self.order.iter().filter_map(|name| self.states.get(name)) {
            let mut flags = Vec::new();
            if state.is_start() {
                flags.push("start");
            }
            if state.is_terminal() {
                flags.push("terminal");
            }
            if flags.is_empty() {
                writeln!(f, "{}", state.name().upper())?;
            } else {
                writeln!(f, "{} ({})", state.name().upper(), flags.join(", "))?;
            }
            for transition in state.transitions().iter() {
                let kind = if transition.is_error_path() {
                    " [error path]"
                } else {
                    ""
                };
                let reads = if transition.is_fallback() {
                    "always".to_string()
                } else {
                    format!("reads {}", transition.inputs.join(", "))
                };
                writeln!(f, "  -> {} ({reads}){kind}", transition.target.upper())?;
            }
        }
        Ok(())
    }
}
