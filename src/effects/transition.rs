//! Guarded transitions and the ordered tables that hold them.

use crate::core::{Guard, InputSnapshot, StateName};

/// A guarded move from the owning state to `target`.
///
/// Error-path transitions are escalations: the poller only accepts them
/// once the owning state's error timeout has elapsed.
#[derive(Clone, Debug)]
pub struct Transition {
    pub target: StateName,
    pub inputs: Vec<String>,
    pub guard: Guard,
    pub error_path: bool,
    pub message: Option<String>,
}

impl Transition {
    /// Evaluate the guard against one snapshot (pure).
    pub fn fires(&self, snapshot: &InputSnapshot) -> bool {
        self.guard.check(&self.inputs, snapshot)
    }

    pub fn is_error_path(&self) -> bool {
        self.error_path
    }

    pub fn is_fallback(&self) -> bool {
        self.guard.is_unconditional()
    }
}

/// Transitions of one state, in declared order.
///
/// Order matters: the scan stops at the first guard that fires, so it
/// both defines the check order and breaks ties.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// First transition whose guard fires, scanning top to bottom (pure).
    pub fn first_match(&self, snapshot: &InputSnapshot) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.fires(snapshot))
    }

    /// Whether the last entry is an unconditional fallback.
    pub fn ends_with_fallback(&self) -> bool {
        self.transitions.last().is_some_and(Transition::is_fallback)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl FromIterator<Transition> for TransitionTable {
    fn from_iter<I: IntoIterator<Item = Transition>>(iter: I) -> Self {
        Self {
            transitions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn transition(target: &str, input: &str, error_path: bool) -> Transition {
        Transition {
            target: StateName::new(target),
            inputs: vec![input.to_string()],
            guard: Guard::new(|names, inputs| inputs.flag(&names[0])),
            error_path,
            message: None,
        }
    }

    fn fallback(target: &str) -> Transition {
        Transition {
            target: StateName::new(target),
            inputs: Vec::new(),
            guard: Guard::always(),
            error_path: false,
            message: None,
        }
    }

    #[test]
    fn first_true_guard_wins() {
        let table: TransitionTable = vec![
            transition("az_disassert", "azHigh", false),
            transition("el_disassert", "elHigh", false),
            fallback("disable_tracking"),
        ]
        .into_iter()
        .collect();

        let both = InputSnapshot::from_iter([("azHigh", Value::from(1)), ("elHigh", Value::from(1))]);
        let el_only = InputSnapshot::from_iter([("elHigh", Value::from(1))]);

        assert_eq!(
            table.first_match(&both).map(|t| t.target.as_str()),
            Some("az_disassert")
        );
        assert_eq!(
            table.first_match(&el_only).map(|t| t.target.as_str()),
            Some("el_disassert")
        );
        assert_eq!(
            table.first_match(&InputSnapshot::new()).map(|t| t.target.as_str()),
            Some("disable_tracking")
        );
    }

    #[test]
    fn error_path_declared_first_is_still_first() {
        let table: TransitionTable = vec![
            transition("rec_error", "stuck", true),
            fallback("clear_nzsf"),
        ]
        .into_iter()
        .collect();

        let snapshot = InputSnapshot::from_iter([("stuck", Value::from(1))]);
        let candidate = table.first_match(&snapshot).unwrap();

        assert_eq!(candidate.target, StateName::new("rec_error"));
        assert!(candidate.is_error_path());
    }

    #[test]
    fn no_match_without_fallback() {
        let table: TransitionTable = vec![transition("a", "x", false)].into_iter().collect();
        assert!(table.first_match(&InputSnapshot::new()).is_none());
        assert!(!table.ends_with_fallback());
    }

    #[test]
    fn fallback_detection_looks_at_last_entry() {
        let mut table = TransitionTable::new();
        table.push(fallback("a"));
        table.push(transition("b", "x", false));
        assert!(!table.ends_with_fallback());

        table.push(fallback("c"));
        assert!(table.ends_with_fallback());
        assert_eq!(table.len(), 3);
    }
}
