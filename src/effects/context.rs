//! Point access and the execution context shared across a run.

use crate::core::{InputSnapshot, StateName, Value, PREV_STATE_INPUT};
use crate::observe::{Observer, RunEvent, TracingObserver};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors reported by a point backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PointError {
    #[error("Point '{0}' does not exist")]
    UnknownPoint(String),

    #[error("Point '{name}' is not connected")]
    Disconnected { name: String },

    #[error("Write to point '{name}' rejected: {reason}")]
    Rejected { name: String, reason: String },
}

/// Errors a state handler can produce.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandlerError {
    #[error("'{0}' is not a registered output")]
    UnknownOutput(String),

    #[error(transparent)]
    Point(#[from] PointError),

    #[error("Handler failed: {0}")]
    Failed(String),
}

/// Read/write capability over named control-system points.
///
/// Implementations wrap whatever communication layer reaches the
/// hardware. Values may change underneath at any time; the engine only
/// observes them through repeated reads.
pub trait PointIo: Send + Sync {
    fn read(&self, name: &str) -> Result<Value, PointError>;

    fn write(&self, name: &str, value: Value) -> Result<(), PointError>;
}

/// In-memory point table.
///
/// Clones share storage, so a test can keep a handle and change inputs
/// while a run is in progress. Every successful write is also appended to
/// a write log.
#[derive(Clone, Debug, Default)]
pub struct MemoryPoints {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, Value>,
    writes: Vec<(String, Value)>,
}

impl MemoryPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Change a value without recording it as a write.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.values.insert(name.into(), value.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.values.get(name).cloned())
    }

    /// Every write performed through [`PointIo::write`], in order.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.inner
            .lock()
            .map(|inner| inner.writes.clone())
            .unwrap_or_default()
    }
}

impl PointIo for MemoryPoints {
    fn read(&self, name: &str) -> Result<Value, PointError> {
        self.get(name)
            .ok_or_else(|| PointError::UnknownPoint(name.to_string()))
    }

    fn write(&self, name: &str, value: Value) -> Result<(), PointError> {
        let mut inner = self.inner.lock().map_err(|_| PointError::Rejected {
            name: name.to_string(),
            reason: "point table poisoned".to_string(),
        })?;
        inner.values.insert(name.to_string(), value.clone());
        inner.writes.push((name.to_string(), value));
        Ok(())
    }
}

/// Everything a running machine passes from state to state: the point
/// capability, which points are inputs and outputs, the synthetic
/// `prevState` input and the event sink.
///
/// One context is shared by reference for the whole run.
#[derive(Clone)]
pub struct ExecutionContext<P> {
    points: P,
    inputs: Vec<String>,
    outputs: BTreeSet<String>,
    prev_state: Option<StateName>,
    observer: Arc<dyn Observer>,
}

impl<P: PointIo> ExecutionContext<P> {
    pub fn new(points: P) -> Self {
        Self {
            points,
            inputs: Vec::new(),
            outputs: BTreeSet::new(),
            prev_state: None,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Register readable inputs. Registration order is the read order of
    /// every snapshot.
    pub fn with_inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.inputs.contains(&name) {
                self.inputs.push(name);
            }
        }
        self
    }

    pub fn with_outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn points(&self) -> &P {
        &self.points
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    pub fn prev_state(&self) -> Option<&StateName> {
        self.prev_state.as_ref()
    }

    pub(crate) fn set_prev_state(&mut self, state: StateName) {
        self.prev_state = Some(state);
    }

    /// Read every registered input once.
    ///
    /// Inputs that fail to read are left out of the snapshot.
    pub fn snapshot(&self) -> InputSnapshot {
        let mut snapshot = InputSnapshot::new();
        for name in &self.inputs {
            match self.points.read(name) {
                Ok(value) => snapshot.insert(name.as_str(), value),
                Err(error) => tracing::debug!(point = %name, %error, "input read failed"),
            }
        }
        if let Some(prev) = &self.prev_state {
            snapshot.insert(PREV_STATE_INPUT, Value::Text(prev.as_str().to_string()));
        }
        snapshot
    }

    /// Write a registered output.
    pub fn write(&self, name: &str, value: impl Into<Value>) -> Result<(), HandlerError> {
        if !self.outputs.contains(name) {
            return Err(HandlerError::UnknownOutput(name.to_string()));
        }
        let value = value.into();
        tracing::debug!(point = %name, %value, "writing output");
        self.points.write(name, value)?;
        Ok(())
    }

    pub fn emit(&self, event: RunEvent) {
        self.observer.emit(&event);
    }

    /// Report a free-form message through the observer.
    pub fn report(&self, message: impl Into<String>) {
        self.emit(RunEvent::Message(message.into()));
    }
}
