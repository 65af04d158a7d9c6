//! nzsf: table-driven fault recovery for telescope mounts
//!
//! The crate runs a finite-state machine that recovers an alt-az mount
//! from a non-zero-speed fault. It follows Stillwater's "pure core,
//! imperative shell" split: guards are pure predicates over an input
//! snapshot, while everything that touches the hardware (point reads and
//! writes, state handlers, waiting) lives in effects.
//!
//! # Core Concepts
//!
//! - **State**: a named node with an entry handler and an ordered
//!   transition table
//! - **Guards**: pure predicates over the inputs a transition declares
//! - **Error paths**: transitions only accepted after the error timeout
//! - **History**: immutable record of every transition taken
//!
//! # Example
//!
//! ```rust
//! use nzsf::builder::{fallback, guarded, StateMachineBuilder};
//! use nzsf::effects::{MemoryPoints, State};
//!
//! let machine = StateMachineBuilder::<MemoryPoints>::new()
//!     .state(
//!         State::new("start")
//!             .start()
//!             .transition(guarded("done", ["ready"], |names, inputs| inputs.flag(&names[0])))
//!             .unwrap()
//!             .transition(fallback("failed"))
//!             .unwrap(),
//!     )
//!     .state(State::new("done").terminal())
//!     .state(State::new("failed").terminal())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(machine.start_state().as_str(), "start");
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod effects;
pub mod observe;
pub mod recovery;

// Re-export commonly used types
pub use builder::{InitializationError, StateMachineBuilder, TransitionBuilder};
pub use core::{Guard, InputSnapshot, RecoveryHistory, StateName, StateTransition, Value};
pub use effects::{ExecutionContext, PointIo, RecoveryOutcome, State, StateMachine};
