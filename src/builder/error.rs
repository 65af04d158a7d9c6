//! Build errors for transitions and state machines.

use thiserror::Error;

/// Errors that can occur when building a single transition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("Transition target state not specified. Call .to(state)")]
    MissingTarget,

    #[error("Transition to '{target}' has no guard. Call .when(..) or .always()")]
    MissingGuard { target: String },
}

/// Structural problems with a set of registered states.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("No Start State defined")]
    NoStartState,

    #[error("More than one Start State defined: {}", .names.join(", "))]
    MultipleStartStates { names: Vec<String> },

    #[error("No End State defined")]
    NoTerminalState,

    #[error("State '{0}' registered more than once")]
    DuplicateState(String),

    #[error("State '{from}' has a transition to unknown state '{to}'")]
    UnknownTarget { from: String, to: String },

    #[error("Terminal state '{0}' must not have transitions")]
    TerminalHasTransitions(String),

    #[error("State '{0}' has no transitions")]
    EmptyTable(String),

    #[error("Last transition of state '{0}' is not an unconditional fallback")]
    MissingFallback(String),

    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error(transparent)]
    Transition(#[from] BuildError),
}

/// Fatal configuration failure. A machine that produced this must not run.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("InitializationError: {}", render(.errors))]
pub struct InitializationError {
    pub errors: Vec<ConfigError>,
}

impl InitializationError {
    pub fn new(errors: Vec<ConfigError>) -> Self {
        Self { errors }
    }

    pub fn contains(&self, error: &ConfigError) -> bool {
        self.errors.contains(error)
    }
}

impl From<BuildError> for InitializationError {
    fn from(error: BuildError) -> Self {
        Self::new(vec![ConfigError::Transition(error)])
    }
}

fn render(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
