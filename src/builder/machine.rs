//! Builder for constructing state machines.
//!
//! `build` checks the whole registration at once and reports every
//! structural problem it finds, not just the first.

use crate::builder::error::{ConfigError, InitializationError};
use crate::core::StateName;
use crate::effects::{PointIo, State, StateMachine, TransitionPoller};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigError>>;

/// Builder for constructing state machines with a fluent API.
pub struct StateMachineBuilder<P> {
    states: Vec<State<P>>,
    poller: TransitionPoller,
}

impl<P: PointIo + Clone + 'static> StateMachineBuilder<P> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            poller: TransitionPoller::default(),
        }
    }

    /// Register a state. States may be registered in any order.
    pub fn state(mut self, state: State<P>) -> Self {
        tracing::debug!(state = %state.name(), "registered state");
        self.states.push(state);
        self
    }

    /// Register several states at once.
    pub fn states(mut self, states: impl IntoIterator<Item = State<P>>) -> Self {
        for state in states {
            self = self.state(state);
        }
        self
    }

    /// How long a state polls before error-path transitions are accepted.
    pub fn error_timeout(mut self, timeout: Duration) -> Self {
        self.poller.error_timeout = timeout;
        self
    }

    /// Back-off between scans of a transition table.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poller.poll_interval = interval;
        self
    }

    /// Validate the registration and build the machine.
    ///
    /// Returns an [`InitializationError`] listing every problem if the
    /// states do not form a runnable machine.
    pub fn build(self) -> Result<StateMachine<P>, InitializationError> {
        let mut checks = vec![
            check_poll_interval(self.poller.poll_interval),
            check_start(&self.states),
            check_terminal(&self.states),
        ];
        checks.extend(check_unique(&self.states));

        let known: HashSet<&StateName> = self.states.iter().map(State::name).collect();
        for state in &self.states {
            checks.extend(check_table(state, &known));
        }

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(assemble(self.states, self.poller)),
            Validation::Failure(errors) => {
                let errors: Vec<ConfigError> = errors.iter().cloned().collect();
                tracing::error!(problems = errors.len(), "state machine failed validation");
                Err(InitializationError::new(errors))
            }
        }
    }
}

impl<P: PointIo + Clone + 'static> Default for StateMachineBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble<P>(states: Vec<State<P>>, poller: TransitionPoller) -> StateMachine<P> {
    let order: Vec<StateName> = states.iter().map(|s| s.name().clone()).collect();
    let terminals: HashSet<StateName> = states
        .iter()
        .filter(|s| s.is_terminal())
        .map(|s| s.name().clone())
        .collect();
    let start = states
        .iter()
        .find(|s| s.is_start())
        .map(|s| s.name().clone())
        .unwrap_or_else(|| StateName::new(""));
    let states: HashMap<StateName, State<P>> = states
        .into_iter()
        .map(|s| (s.name().clone(), s))
        .collect();

    StateMachine {
        states,
        order,
        previous: start.clone(),
        start,
        terminals,
        poller,
    }
}

fn check_poll_interval(interval: Duration) -> Check {
    if interval.is_zero() {
        Validation::fail(ConfigError::ZeroPollInterval)
    } else {
        Validation::success(())
    }
}

fn check_start<P>(states: &[State<P>]) -> Check {
    let starts: Vec<String> = states
        .iter()
        .filter(|s| s.is_start())
        .map(|s| s.name().to_string())
        .collect();
    match starts.len() {
        0 => Validation::fail(ConfigError::NoStartState),
        1 => Validation::success(()),
        _ => Validation::fail(ConfigError::MultipleStartStates { names: starts }),
    }
}

fn check_terminal<P>(states: &[State<P>]) -> Check {
    if states.iter().any(State::is_terminal) {
        Validation::success(())
    } else {
        Validation::fail(ConfigError::NoTerminalState)
    }
}

fn check_unique<P>(states: &[State<P>]) -> Vec<Check> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut checks = Vec::new();
    for state in states {
        let name = state.name();
        if !seen.insert(name) && reported.insert(name) {
            checks.push(Validation::fail(ConfigError::DuplicateState(
                name.to_string(),
            )));
        }
    }
    checks
}

fn check_table<P>(state: &State<P>, known: &HashSet<&StateName>) -> Vec<Check> {
    let name = state.name().to_string();
    let table = state.transitions();
    let mut checks = Vec::new();

    if state.is_terminal() {
        if !table.is_empty() {
            checks.push(Validation::fail(ConfigError::TerminalHasTransitions(name)));
        }
        return checks;
    }

    if table.is_empty() {
        checks.push(Validation::fail(ConfigError::EmptyTable(name.clone())));
    } else if !table.ends_with_fallback() {
        checks.push(Validation::fail(ConfigError::MissingFallback(name.clone())));
    }

    for transition in table.iter() {
        if !known.contains(&transition.target) {
            checks.push(Validation::fail(ConfigError::UnknownTarget {
                from: name.clone(),
                to: transition.target.to_string(),
            }));
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::effects::MemoryPoints;

    type Builder = StateMachineBuilder<MemoryPoints>;

    fn to(target: &str) -> TransitionBuilder {
        TransitionBuilder::new().to(target).always()
    }

    fn start(target: &str) -> State<MemoryPoints> {
        State::new("start").start().transition(to(target)).unwrap()
    }

    fn errors_of(
        result: Result<StateMachine<MemoryPoints>, InitializationError>,
    ) -> Vec<ConfigError> {
        match result {
            Ok(_) => panic!("expected validation failure"),
            Err(error) => error.errors,
        }
    }

    #[test]
    fn builder_requires_start_and_terminal() {
        let errors = errors_of(Builder::new().build());
        assert!(errors.contains(&ConfigError::NoStartState));
        assert!(errors.contains(&ConfigError::NoTerminalState));
    }

    #[test]
    fn two_start_states_are_rejected() {
        let errors = errors_of(
            Builder::new()
                .state(start("end"))
                .state(State::new("other").start().transition(to("end")).unwrap())
                .state(State::new("end").terminal())
                .build(),
        );
        assert_eq!(
            errors,
            vec![ConfigError::MultipleStartStates {
                names: vec!["start".to_string(), "other".to_string()]
            }]
        );
    }

    #[test]
    fn unknown_targets_are_rejected() {
        let errors = errors_of(
            Builder::new()
                .state(start("nowhere"))
                .state(State::new("end").terminal())
                .build(),
        );
        assert_eq!(
            errors,
            vec![ConfigError::UnknownTarget {
                from: "start".to_string(),
                to: "nowhere".to_string()
            }]
        );
    }

    #[test]
    fn targets_resolve_case_insensitively() {
        let machine = Builder::new()
            .state(start("END"))
            .state(State::new("end").terminal())
            .build();
        assert!(machine.is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected_once() {
        let errors = errors_of(
            Builder::new()
                .state(start("end"))
                .state(State::new("end").terminal())
                .state(State::new("END").terminal())
                .state(State::new("End").terminal())
                .build(),
        );
        assert_eq!(errors, vec![ConfigError::DuplicateState("END".to_string())]);
    }

    #[test]
    fn tables_must_end_with_fallback() {
        let guarded = TransitionBuilder::new()
            .to("end")
            .reads(["x"])
            .when(|names, inputs| inputs.flag(&names[0]));
        let errors = errors_of(
            Builder::new()
                .state(State::new("start").start().transition(guarded).unwrap())
                .state(State::new("idle"))
                .state(State::new("end").terminal())
                .build(),
        );
        assert!(errors.contains(&ConfigError::MissingFallback("start".to_string())));
        assert!(errors.contains(&ConfigError::EmptyTable("idle".to_string())));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        let errors = errors_of(
            Builder::new()
                .state(start("end"))
                .state(State::new("end").terminal().transition(to("start")).unwrap())
                .build(),
        );
        assert_eq!(
            errors,
            vec![ConfigError::TerminalHasTransitions("end".to_string())]
        );
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let errors = errors_of(
            Builder::new()
                .state(start("end"))
                .state(State::new("end").terminal())
                .poll_interval(Duration::ZERO)
                .build(),
        );
        assert_eq!(errors, vec![ConfigError::ZeroPollInterval]);
    }

    #[test]
    fn valid_machine_exposes_its_shape() {
        let machine = Builder::new()
            .state(State::new("end").terminal())
            .state(start("end"))
            .error_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(machine.start_state(), &StateName::new("start"));
        assert_eq!(machine.previous_state(), &StateName::new("start"));
        assert!(machine.is_terminal(&StateName::new("END")));
        assert_eq!(machine.terminal_states().len(), 1);
        assert_eq!(machine.poller().error_timeout, Duration::from_secs(5));
        let names: Vec<_> = machine.states().map(|s| s.name().as_str()).collect();
        assert_eq!(names, vec!["end", "start"]);
    }
}
