//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders for transitions and machines.
//! Structural validation happens once, in [`StateMachineBuilder::build`].

pub mod error;
pub mod machine;
pub mod transition;

pub use error::{BuildError, ConfigError, InitializationError};
pub use machine::StateMachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::{InputSnapshot, StateName};

/// Unconditional fallback transition, the last entry of a table.
///
/// # Example
///
/// ```
/// use nzsf::builder::fallback;
///
/// let transition = fallback("clear_nzsf").build().unwrap();
/// assert!(transition.is_fallback());
/// ```
pub fn fallback(to: impl Into<StateName>) -> TransitionBuilder {
    TransitionBuilder::new().to(to).always()
}

/// Transition guarded by a predicate over the named inputs.
///
/// # Example
///
/// ```
/// use nzsf::builder::guarded;
/// use nzsf::core::InputSnapshot;
///
/// let transition = guarded("follow_off", ["mcsFollow"], |names, inputs| {
///     inputs.flag(&names[0])
/// })
/// .build()
/// .unwrap();
///
/// let following = InputSnapshot::from_iter([("mcsFollow", 1.into())]);
/// assert!(transition.fires(&following));
/// ```
pub fn guarded<I, S, F>(to: impl Into<StateName>, inputs: I, guard: F) -> TransitionBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static,
{
    TransitionBuilder::new().to(to).reads(inputs).when(guard)
}
