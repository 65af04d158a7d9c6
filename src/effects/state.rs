//! States: an entry handler plus an ordered transition table.

use crate::builder::{BuildError, TransitionBuilder};
use crate::core::StateName;
use crate::effects::context::{ExecutionContext, HandlerError, PointIo};
use crate::effects::transition::TransitionTable;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;

/// Factory for a state's entry effect.
/// A fresh effect is created on every visit.
pub type StateHandler<P> =
    Arc<dyn Fn() -> BoxedEffect<(), HandlerError, ExecutionContext<P>> + Send + Sync>;

/// A named node of the recovery graph.
///
/// The handler runs exactly once per visit, before the transition table
/// is polled. Waiting for the hardware to react belongs in guards; the
/// only pause a state may impose itself is its fixed settle delay.
pub struct State<P> {
    name: StateName,
    handler: Option<StateHandler<P>>,
    transitions: TransitionTable,
    settle: Option<Duration>,
    is_start: bool,
    is_terminal: bool,
}

impl<P: PointIo + Clone + 'static> State<P> {
    pub fn new(name: impl Into<StateName>) -> Self {
        Self {
            name: name.into(),
            handler: None,
            transitions: TransitionTable::new(),
            settle: None,
            is_start: false,
            is_terminal: false,
        }
    }

    /// Mark this state as the machine's start state.
    pub fn start(mut self) -> Self {
        self.is_start = true;
        self
    }

    /// Mark this state as terminal.
    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }

    /// Set the entry effect factory.
    pub fn handler<E>(mut self, effect: E) -> Self
    where
        E: Fn() -> BoxedEffect<(), HandlerError, ExecutionContext<P>> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(effect));
        self
    }

    /// Set a plain function as the entry action.
    pub fn on_entry<F>(self, action: F) -> Self
    where
        F: Fn(&ExecutionContext<P>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let action = Arc::new(action);
        self.handler(move || {
            let action = Arc::clone(&action);
            from_fn(move |ctx: &ExecutionContext<P>| action(ctx)).boxed()
        })
    }

    /// Fixed pause after the handler, before polling starts.
    pub fn settle(mut self, delay: Duration) -> Self {
        self.settle = Some(delay);
        self
    }

    /// Append a transition from a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder) -> Result<Self, BuildError> {
        self.transitions.push(builder.build()?);
        Ok(self)
    }

    pub(crate) fn entry_effect(&self) -> BoxedEffect<(), HandlerError, ExecutionContext<P>> {
        match &self.handler {
            Some(factory) => factory(),
            None => pure(()).boxed(),
        }
    }
}

impl<P> State<P> {
    pub fn name(&self) -> &StateName {
        &self.name
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn settle_delay(&self) -> Option<Duration> {
        self.settle
    }

    pub fn is_start(&self) -> bool {
        self.is_start
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl<P> fmt::Debug for State<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("transitions", &self.transitions.len())
            .field("settle", &self.settle)
            .field("is_start", &self.is_start)
            .field("is_terminal", &self.is_terminal)
            .finish()
    }
}
