//! Core state machine types and logic.
//!
//! This module contains the pure core of the recovery engine:
//! - State identifiers via [`StateName`]
//! - Point values and per-poll [`InputSnapshot`]s
//! - Guard predicates for transition control
//! - Immutable run history
//!
//! Nothing in this module reads or writes points.

mod guard;
mod history;
mod snapshot;
mod state;

pub use guard::Guard;
pub use history::{RecoveryHistory, StateTransition};
pub use snapshot::{InputSnapshot, Value, PREV_STATE_INPUT};
pub use state::StateName;
