//! A simulated telescope mount for dry runs and tests.
//!
//! The model reacts to the recovery's commands the way a healthy mount
//! would. Points marked as stuck ignore commands, which is how the
//! failure scenarios are produced.

use super::points::*;
use crate::config::SimulationConfig;
use crate::core::Value;
use crate::effects::{PointError, PointIo};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Preset starting conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum Scenario {
    /// Live fault on a following mount; every command takes effect.
    Nominal,
    /// Both fault summaries already clear.
    NoFault,
    /// Follow mode cannot be switched off.
    StuckFollow,
    /// Azimuth reference voltage does not respond to the reset.
    StuckVoltage,
    /// Azimuth drive stays asserted.
    DriveFault,
    /// Azimuth never settles after follow mode comes back.
    TrackingLost,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::Nominal,
        Scenario::NoFault,
        Scenario::StuckFollow,
        Scenario::StuckVoltage,
        Scenario::DriveFault,
        Scenario::TrackingLost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Nominal => "nominal",
            Scenario::NoFault => "no-fault",
            Scenario::StuckFollow => "stuck-follow",
            Scenario::StuckVoltage => "stuck-voltage",
            Scenario::DriveFault => "drive-fault",
            Scenario::TrackingLost => "tracking-lost",
        }
    }

    /// Build a mount in this scenario's starting condition.
    pub fn mount(self) -> SimulatedMount {
        let mount = SimulatedMount::nominal();
        match self {
            Scenario::Nominal => {}
            Scenario::NoFault => {
                mount.set(NZS_AZ, 0);
                mount.set(VOLT_AZ, 0.0);
                mount.set(AZ_POS_ERR, 0.0);
            }
            Scenario::StuckFollow => mount.stick(MCS_FOLLOW),
            Scenario::StuckVoltage => mount.stick(VOLT_AZ),
            Scenario::DriveFault => mount.stick(AZ_DRIVE_COND),
            Scenario::TrackingLost => mount.stick(AZ_POS_ERR),
        }
        mount
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory mount model implementing [`PointIo`].
///
/// Clones share the model, so a caller can keep a handle to inspect the
/// command log after a run.
#[derive(Clone, Debug, Default)]
pub struct SimulatedMount {
    model: Arc<Mutex<MountModel>>,
}

#[derive(Debug, Default)]
struct MountModel {
    values: HashMap<String, Value>,
    stuck: HashSet<String>,
    pending_follow: Option<bool>,
    commands: Vec<(String, Value)>,
}

impl MountModel {
    fn drive(&mut self, name: &str, value: Value) {
        if self.stuck.contains(name) {
            tracing::debug!(point = %name, %value, "stuck point ignored command");
            return;
        }
        self.values.insert(name.to_string(), value);
    }

    fn apply(&mut self, name: &str, value: &Value) -> Result<(), PointError> {
        match name {
            TCS_MCS_FOLLOW => {
                let directive = value.as_str().map(str::to_ascii_lowercase);
                self.pending_follow = match directive.as_deref() {
                    Some("on") => Some(true),
                    Some("off") => Some(false),
                    _ => {
                        return Err(PointError::Rejected {
                            name: name.to_string(),
                            reason: format!("unknown follow directive {value}"),
                        })
                    }
                };
            }
            TCS_APPLY if value.as_f64() == Some(f64::from(APPLY_DIRECTIVES)) => {
                if let Some(on) = self.pending_follow.take() {
                    self.drive(MCS_FOLLOW, Value::from(on));
                    if on {
                        self.drive(AZ_POS_ERR, Value::from(0.0));
                        self.drive(EL_POS_ERR, Value::from(0.0));
                    }
                }
            }
            F1_RESET if value.is_truthy() => {
                for point in [VOLT_AZ, VOLT_EL] {
                    self.drive(point, Value::from(0.0));
                }
                for point in [NZS_AZ, NZS_EL] {
                    self.drive(point, Value::from(0));
                }
            }
            AZ_DRIVE_EN => self.drive(AZ_DRIVE_COND, value.clone()),
            EL_DRIVE_EN => self.drive(EL_DRIVE_COND, value.clone()),
            _ => {}
        }
        Ok(())
    }
}

impl SimulatedMount {
    /// Empty model: every read fails until values are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Following mount with a live azimuth fault and both drives asserted.
    pub fn nominal() -> Self {
        let mount = Self::new();
        for (name, value) in [
            (NZS_AZ, Value::from(1)),
            (NZS_EL, Value::from(0)),
            (MCS_FOLLOW, Value::from(1)),
            (VOLT_AZ, Value::from(0.8)),
            (VOLT_EL, Value::from(0.0)),
            (AZ_DRIVE_COND, Value::from(DRIVE_ASSERTED)),
            (EL_DRIVE_COND, Value::from(DRIVE_ASSERTED)),
            (AZ_POS_ERR, Value::from(0.5)),
            (EL_POS_ERR, Value::from(0.0)),
        ] {
            mount.set(name, value);
        }
        mount
    }

    /// Scenario preset with configured overrides layered on top.
    pub fn from_config(scenario: Scenario, config: &SimulationConfig) -> Self {
        let mount = scenario.mount();
        for (name, value) in &config.initial {
            mount.set(name.as_str(), value.clone());
        }
        for name in &config.stuck {
            mount.stick(name.as_str());
        }
        mount
    }

    fn model(&self) -> Result<MutexGuard<'_, MountModel>, PointError> {
        self.model.lock().map_err(|_| PointError::Disconnected {
            name: "simulated mount".to_string(),
        })
    }

    /// Set a value directly, bypassing the command model.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        if let Ok(mut model) = self.model() {
            model.values.insert(name.into(), value.into());
        }
    }

    /// Make a point ignore every command from now on.
    pub fn stick(&self, name: impl Into<String>) {
        if let Ok(mut model) = self.model() {
            model.stuck.insert(name.into());
        }
    }

    /// Let a stuck point follow commands again.
    pub fn release(&self, name: &str) {
        if let Ok(mut model) = self.model() {
            model.stuck.remove(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.model().ok()?.values.get(name).cloned()
    }

    /// Every command written, in order.
    pub fn commands(&self) -> Vec<(String, Value)> {
        self.model()
            .map(|model| model.commands.clone())
            .unwrap_or_default()
    }

    pub fn commanded(&self, name: &str) -> Vec<Value> {
        self.commands()
            .into_iter()
            .filter(|(point, _)| point == name)
            .map(|(_, value)| value)
            .collect()
    }
}

impl PointIo for SimulatedMount {
    fn read(&self, name: &str) -> Result<Value, PointError> {
        self.model()?
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| PointError::UnknownPoint(name.to_string()))
    }

    fn write(&self, name: &str, value: Value) -> Result<(), PointError> {
        let mut model = self.model()?;
        model.apply(name, &value)?;
        model.values.insert(name.to_string(), value.clone());
        model.commands.push((name.to_string(), value));
        Ok(())
    }
}
