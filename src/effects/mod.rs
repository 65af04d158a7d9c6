//! Effectful state machine operations using Stillwater 0.11.0.
//!
//! This module provides the "imperative shell" around the pure core:
//! reading and writing points, running state handlers, polling
//! transition tables against the clock, and the run loop.
//!
//! # Key Concepts
//!
//! - **Points**: Injected read/write capability ([`PointIo`])
//! - **Handlers**: Entry effects, created fresh on every visit
//! - **Poller**: Re-scans a table until a transition is acceptable
//! - **State Machine**: Drives states from start to a terminal state

mod context;
mod machine;
mod poll;
mod state;
mod transition;

pub use context::{ExecutionContext, HandlerError, MemoryPoints, PointError, PointIo};
pub use machine::{RecoveryOutcome, StateMachine};
pub use poll::{Decision, TransitionPoller, DEFAULT_ERROR_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use state::{State, StateHandler};
pub use transition::{Transition, TransitionTable};
