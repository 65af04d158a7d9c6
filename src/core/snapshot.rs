//! Point values and per-poll input snapshots.
//!
//! Guards never touch live points. Each poll reads every registered input
//! once into an [`InputSnapshot`], and guards are evaluated against that
//! plain data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of the synthetic input carrying the previously visited state.
pub const PREV_STATE_INPUT: &str = "prevState";

/// Scalar value carried by a point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }

    /// Non-zero numbers and non-empty text are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Number(if b { 1.0 } else { 0.0 })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Values of every readable input at one instant.
///
/// Lookups are total: a missing input yields `None` (or `false` for
/// [`InputSnapshot::flag`]) instead of panicking, so guards built on these
/// helpers cannot fail.
///
/// # Example
///
/// ```rust
/// use nzsf::core::InputSnapshot;
///
/// let snapshot = InputSnapshot::from_iter([("voltAz", (-0.7).into()), ("mcsFollow", 1.into())]);
///
/// assert_eq!(snapshot.magnitude("voltAz"), Some(0.7));
/// assert!(snapshot.flag("mcsFollow"));
/// assert!(!snapshot.flag("nzsEl"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    values: HashMap<String, Value>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Absolute value of a numeric input.
    pub fn magnitude(&self, name: &str) -> Option<f64> {
        self.number(name).map(f64::abs)
    }

    /// Truthiness of an input; missing inputs read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(Value::is_truthy)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// The state the machine arrived from, if any transition happened yet.
    pub fn prev_state(&self) -> Option<&str> {
        self.text(PREV_STATE_INPUT)
    }

    pub fn prev_state_is(&self, name: &str) -> bool {
        self.prev_state()
            .is_some_and(|prev| prev.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for InputSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
