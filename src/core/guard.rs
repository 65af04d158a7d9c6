//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions over an [`InputSnapshot`]. They
//! receive the ordered names of the inputs their transition declares plus
//! the full snapshot, so they can be tested with plain data instead of
//! live hardware points.

use super::snapshot::InputSnapshot;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&[String], &InputSnapshot) -> bool + Send + Sync>;

/// Pure predicate that decides whether a transition fires.
///
/// # Example
///
/// ```rust
/// use nzsf::core::{Guard, InputSnapshot};
///
/// // Fires when every declared input reads as cleared
/// let cleared = Guard::new(|names, inputs| names.iter().all(|n| !inputs.flag(n)));
/// let names = vec!["nzsAz".to_string(), "nzsEl".to_string()];
///
/// let faulted = InputSnapshot::from_iter([("nzsAz", 1.into()), ("nzsEl", 0.into())]);
/// let healthy = InputSnapshot::from_iter([("nzsAz", 0.into()), ("nzsEl", 0.into())]);
///
/// assert!(!cleared.check(&names, &faulted));
/// assert!(cleared.check(&names, &healthy));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Predicate,
    unconditional: bool,
}

impl Guard {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic, side-effect free and total
    /// over missing inputs.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
            unconditional: false,
        }
    }

    /// Guard that always fires. Used for the fallback entry that ends
    /// every non-terminal transition table.
    pub fn always() -> Self {
        Guard {
            predicate: Arc::new(|_: &[String], _: &InputSnapshot| true),
            unconditional: true,
        }
    }

    pub fn check(&self, names: &[String], inputs: &InputSnapshot) -> bool {
        (self.predicate)(names, inputs)
    }

    /// Whether this guard was built with [`Guard::always`].
    pub fn is_unconditional(&self) -> bool {
        self.unconditional
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("unconditional", &self.unconditional)
            .finish_non_exhaustive()
    }
}
