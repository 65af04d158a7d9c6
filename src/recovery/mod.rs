//! Non-zero-speed fault recovery for an alt-az telescope mount.
//!
//! The procedure switches follow mode off, zeroes the drive reference
//! voltages, clears the fault, cycles both drives and re-enables
//! tracking. Every step that depends on the hardware reacting has an
//! error-path escape to `rec_error`, taken only once the error timeout
//! has passed.
//!
//! # Example
//!
//! ```rust,no_run
//! use nzsf::config::RecoveryConfig;
//! use nzsf::recovery::{recovery_context, recovery_machine, Scenario};
//!
//! # async fn demo() -> Result<(), nzsf::builder::InitializationError> {
//! let mount = Scenario::Nominal.mount();
//! let machine = recovery_machine(&RecoveryConfig::default())?;
//! let mut ctx = recovery_context(mount);
//!
//! let outcome = machine.run(&mut ctx).await;
//! assert!(outcome.ended_on("rec_success"));
//! # Ok(())
//! # }
//! ```

pub mod points;
mod procedure;
mod simulator;

pub use simulator::{Scenario, SimulatedMount};

use crate::builder::{InitializationError, StateMachineBuilder};
use crate::config::RecoveryConfig;
use crate::effects::{ExecutionContext, PointIo, StateMachine};

/// Names of the recovery states.
pub mod states {
    pub const START: &str = "start";
    pub const NO_FAULT: &str = "no_fault";
    pub const FOLLOW_OFF: &str = "follow_off";
    pub const VOLTAGE_ZERO: &str = "voltage_zero";
    pub const CLEAR_NZSF: &str = "clear_nzsf";
    pub const FAULT_CLEARED: &str = "fault_cleared";
    pub const AZ_DISASSERT: &str = "az_disassert";
    pub const EL_DISASSERT: &str = "el_disassert";
    pub const DISABLE_TRACKING: &str = "disable_tracking";
    pub const AZ_ASSERT: &str = "az_assert";
    pub const ENABLE_TRACKING: &str = "enable_tracking";
    pub const EL_ASSERT: &str = "el_assert";
    pub const FOLLOW_ON: &str = "follow_on";
    pub const REC_SUCCESS: &str = "rec_success";
    pub const REC_ERROR: &str = "rec_error";
}

/// Build the validated recovery machine with the configured timing.
pub fn recovery_machine<P>(config: &RecoveryConfig) -> Result<StateMachine<P>, InitializationError>
where
    P: PointIo + Clone + 'static,
{
    let states = procedure::recovery_states(&config.thresholds)?;
    StateMachineBuilder::new()
        .error_timeout(config.engine.error_timeout())
        .poll_interval(config.engine.poll_interval())
        .states(states)
        .build()
}

/// Execution context with every recovery input and output registered.
pub fn recovery_context<P: PointIo>(io: P) -> ExecutionContext<P> {
    ExecutionContext::new(io)
        .with_inputs(points::INPUTS)
        .with_outputs(points::OUTPUTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::StateName;
    use crate::effects::MemoryPoints;
    use std::time::Duration;

    #[test]
    fn default_machine_validates() {
        let machine: StateMachine<MemoryPoints> =
            recovery_machine(&RecoveryConfig::default()).unwrap();

        assert_eq!(machine.start_state(), &StateName::new(states::START));
        assert_eq!(machine.states().count(), 15);
        assert_eq!(machine.terminal_states().len(), 3);
        assert_eq!(machine.poller().error_timeout, Duration::from_secs(90));
    }

    #[test]
    fn engine_settings_reach_poller() {
        let config = RecoveryConfig {
            engine: EngineConfig {
                error_timeout_secs: 2.5,
                poll_interval_ms: 10,
            },
            ..RecoveryConfig::default()
        };
        let machine: StateMachine<MemoryPoints> = recovery_machine(&config).unwrap();

        assert_eq!(machine.poller().error_timeout, Duration::from_millis(2500));
        assert_eq!(machine.poller().poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = RecoveryConfig {
            engine: EngineConfig {
                error_timeout_secs: 90.0,
                poll_interval_ms: 0,
            },
            ..RecoveryConfig::default()
        };
        let result: Result<StateMachine<MemoryPoints>, _> = recovery_machine(&config);

        assert!(result.is_err());
    }

    #[test]
    fn context_registers_points() {
        let ctx = recovery_context(MemoryPoints::new());

        assert_eq!(ctx.inputs().len(), points::INPUTS.len());
        assert_eq!(ctx.outputs().count(), points::OUTPUTS.len());
    }
}
