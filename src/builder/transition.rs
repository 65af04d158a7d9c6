//! Builder for constructing guarded transitions.

use crate::builder::error::BuildError;
use crate::core::{Guard, InputSnapshot, StateName};
use crate::effects::Transition;

/// Builder for constructing transitions with a fluent API.
#[derive(Debug, Default)]
pub struct TransitionBuilder {
    to: Option<StateName>,
    inputs: Vec<String>,
    guard: Option<Guard>,
    error_path: bool,
    message: Option<String>,
}

impl TransitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<StateName>) -> Self {
        self.to = Some(state.into());
        self
    }

    /// Declare the inputs the guard reads, in the order it expects them.
    pub fn reads<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set a pre-built guard (required unless `always` is used).
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Set the guard from a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Make this an unconditional fallback.
    pub fn always(mut self) -> Self {
        self.guard = Some(Guard::always());
        self
    }

    /// Only accept this transition once the state's error timeout elapsed.
    pub fn error_path(mut self) -> Self {
        self.error_path = true;
        self
    }

    /// Message reported when the transition fires.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn build(self) -> Result<Transition, BuildError> {
        let target = self.to.ok_or(BuildError::MissingTarget)?;
        let guard = self.guard.ok_or_else(|| BuildError::MissingGuard {
            target: target.to_string(),
        })?;

        Ok(Transition {
            target,
            inputs: self.inputs,
            guard,
            error_path: self.error_path,
            message: self.message.filter(|m| !m.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::new().reads(["mcsFollow"]).build();
        assert!(matches!(result, Err(BuildError::MissingTarget)));
    }

    #[test]
    fn builder_validates_missing_guard() {
        let result = TransitionBuilder::new().to("follow_off").build();
        assert!(matches!(result, Err(BuildError::MissingGuard { .. })));
    }

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionBuilder::new()
            .to("rec_error")
            .reads(["mcsFollow"])
            .when(|names, inputs| inputs.flag(&names[0]))
            .error_path()
            .message("Error: Could not disable MCS Tracking")
            .build()
            .unwrap();

        assert_eq!(transition.target, StateName::new("rec_error"));
        assert_eq!(transition.inputs, vec!["mcsFollow".to_string()]);
        assert!(transition.is_error_path());
        assert_eq!(
            transition.message.as_deref(),
            Some("Error: Could not disable MCS Tracking")
        );

        let following = InputSnapshot::from_iter([("mcsFollow", Value::from(1))]);
        assert!(transition.fires(&following));
    }

    #[test]
    fn prebuilt_guard_is_used() {
        let cleared = Guard::new(|names, inputs| names.iter().all(|n| !inputs.flag(n)));
        let transition = TransitionBuilder::new()
            .to("no_fault")
            .reads(["nzsAz", "nzsEl"])
            .guard(cleared)
            .build()
            .unwrap();

        let faulted = InputSnapshot::from_iter([("nzsAz", Value::from(1))]);
        assert!(!transition.fires(&faulted));
        assert!(!transition.is_fallback());
    }

    #[test]
    fn always_builds_fallback() {
        let transition = TransitionBuilder::new().to("clear_nzsf").always().build().unwrap();
        assert!(transition.is_fallback());
        assert!(!transition.is_error_path());
        assert!(transition.fires(&InputSnapshot::new()));
    }

    #[test]
    fn empty_message_is_dropped() {
        let transition = TransitionBuilder::new()
            .to("clear_nzsf")
            .always()
            .message("")
            .build()
            .unwrap();
        assert!(transition.message.is_none());
    }
}
