//! States and transition tables of the non-zero-speed fault recovery.
//!
//! Each table lists error-path escalations first, then the normal exits,
//! and ends with an unconditional fallback. While an escalation's guard
//! holds the poller keeps waiting, so the escalation only fires if the
//! hardware has not reacted within the error timeout.

use super::points::*;
use super::states::*;
use crate::builder::{fallback, guarded, BuildError};
use crate::config::Thresholds;
use crate::core::{InputSnapshot, PREV_STATE_INPUT};
use crate::effects::{ExecutionContext, HandlerError, PointIo, State};

type Step<P> = Result<State<P>, BuildError>;

/// All fifteen states, in the order they are usually visited.
pub(crate) fn recovery_states<P: PointIo + Clone + 'static>(
    thresholds: &Thresholds,
) -> Result<Vec<State<P>>, BuildError> {
    Ok(vec![
        start(thresholds)?,
        no_fault(),
        follow_off(thresholds)?,
        voltage_zero(thresholds)?,
        clear_nzsf()?,
        fault_cleared()?,
        az_disassert()?,
        el_disassert()?,
        disable_tracking()?,
        az_assert()?,
        enable_tracking()?,
        el_assert()?,
        follow_on(thresholds)?,
        rec_success(),
        rec_error(),
    ])
}

// Guard building blocks. Missing inputs never count as confirmation.

fn is_clear(inputs: &InputSnapshot, name: &str) -> bool {
    inputs.get(name).is_some_and(|v| !v.is_truthy())
}

fn any_above(limit: f64) -> impl Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static {
    move |names: &[String], inputs: &InputSnapshot| {
        names
            .iter()
            .any(|n| inputs.magnitude(n).is_some_and(|v| v > limit))
    }
}

fn not_all_below(limit: f64) -> impl Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static {
    move |names: &[String], inputs: &InputSnapshot| {
        !names
            .iter()
            .all(|n| inputs.magnitude(n).is_some_and(|v| v <= limit))
    }
}

fn equals(expected: i32) -> impl Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static {
    move |names: &[String], inputs: &InputSnapshot| {
        names.first().and_then(|n| inputs.number(n)) == Some(f64::from(expected))
    }
}

fn differs(expected: i32) -> impl Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static {
    move |names: &[String], inputs: &InputSnapshot| {
        names.first().and_then(|n| inputs.number(n)) != Some(f64::from(expected))
    }
}

/// The mount is tracking: either axis is driving against a position
/// error, or both axes are on target.
fn tracking(
    thresholds: &Thresholds,
) -> impl Fn(&[String], &InputSnapshot) -> bool + Send + Sync + 'static {
    let zero = thresholds.voltage_zero;
    let max_error = thresholds.position_error;
    move |_: &[String], inputs: &InputSnapshot| {
        let correcting = |volt: &str, pos: &str| {
            inputs.magnitude(volt).is_some_and(|v| v > zero)
                && inputs.magnitude(pos).is_some_and(|e| e > max_error)
        };
        let on_target = [AZ_POS_ERR, EL_POS_ERR]
            .iter()
            .all(|pos| inputs.magnitude(pos).is_some_and(|e| e < max_error));
        correcting(VOLT_AZ, AZ_POS_ERR) || correcting(VOLT_EL, EL_POS_ERR) || on_target
    }
}

fn announce<P: PointIo + Clone + 'static>(
    message: &'static str,
) -> impl Fn(&ExecutionContext<P>) -> Result<(), HandlerError> + Send + Sync + 'static {
    move |ctx: &ExecutionContext<P>| {
        ctx.report(message);
        Ok(())
    }
}

fn start<P: PointIo + Clone + 'static>(thresholds: &Thresholds) -> Step<P> {
    State::new(START)
        .start()
        .on_entry(announce("Initiating Non Zero Speed Fault Recovery"))
        .transition(guarded(NO_FAULT, [NZS_AZ, NZS_EL], |names, inputs| {
            names.iter().all(|n| is_clear(inputs, n))
        }))?
        .transition(guarded(FOLLOW_OFF, [MCS_FOLLOW], |_, inputs| {
            inputs.flag(MCS_FOLLOW)
        }))?
        .transition(guarded(
            VOLTAGE_ZERO,
            [VOLT_AZ, VOLT_EL],
            any_above(thresholds.voltage_fault),
        ))?
        .transition(fallback(CLEAR_NZSF))
}

fn no_fault<P: PointIo + Clone + 'static>() -> State<P> {
    State::new(NO_FAULT)
        .terminal()
        .on_entry(announce("Non Zero Speed Fault not present, ending sequence"))
}

fn follow_off<P: PointIo + Clone + 'static>(thresholds: &Thresholds) -> Step<P> {
    State::new(FOLLOW_OFF)
        .on_entry(|ctx| {
            ctx.write(TCS_MCS_FOLLOW, "Off")?;
            ctx.write(TCS_APPLY, APPLY_DIRECTIVES)
        })
        .transition(
            guarded(REC_ERROR, [MCS_FOLLOW], |_, inputs| {
                !is_clear(inputs, MCS_FOLLOW)
            })
            .error_path()
            .message("Error: Could not disable MCS Tracking"),
        )?
        .transition(guarded(FOLLOW_ON, [PREV_STATE_INPUT], |_, inputs| {
            inputs.prev_state_is(FOLLOW_ON)
        }))?
        .transition(guarded(
            VOLTAGE_ZERO,
            [VOLT_AZ, VOLT_EL],
            any_above(thresholds.voltage_fault),
        ))?
        .transition(fallback(CLEAR_NZSF))
}

fn voltage_zero<P: PointIo + Clone + 'static>(thresholds: &Thresholds) -> Step<P> {
    State::new(VOLTAGE_ZERO)
        .on_entry(|ctx| ctx.write(F1_RESET, 1))
        .settle(thresholds.reset_settle())
        .transition(
            guarded(
                REC_ERROR,
                [VOLT_AZ, VOLT_EL],
                not_all_below(thresholds.voltage_zero),
            )
            .error_path()
            .message("Error: Unable to zero reference voltage"),
        )?
        .transition(fallback(CLEAR_NZSF))
}

fn clear_nzsf<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(CLEAR_NZSF)
        .on_entry(|ctx| ctx.write(F1_RESET, 1))
        .transition(
            guarded(REC_ERROR, [NZS_AZ, NZS_EL], |names, inputs| {
                !names.iter().all(|n| is_clear(inputs, n))
            })
            .error_path()
            .message("Error: Unable to clear Non Zero Speed Fault from GIS"),
        )?
        .transition(fallback(FAULT_CLEARED))
}

fn fault_cleared<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(FAULT_CLEARED)
        .transition(guarded(AZ_DISASSERT, [AZ_DRIVE_COND], equals(DRIVE_ASSERTED)))?
        .transition(guarded(EL_DISASSERT, [EL_DRIVE_COND], equals(DRIVE_ASSERTED)))?
        .transition(fallback(DISABLE_TRACKING))
}

fn az_disassert<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(AZ_DISASSERT)
        .on_entry(|ctx| ctx.write(AZ_DRIVE_EN, DRIVE_DISASSERTED))
        .transition(
            guarded(REC_ERROR, [AZ_DRIVE_COND], differs(DRIVE_DISASSERTED))
                .error_path()
                .message("Error: Azimuth Drive did not disassert"),
        )?
        .transition(fallback(EL_DISASSERT))
}

fn el_disassert<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(EL_DISASSERT)
        .on_entry(|ctx| ctx.write(EL_DRIVE_EN, DRIVE_DISASSERTED))
        .transition(
            guarded(REC_ERROR, [EL_DRIVE_COND], differs(DRIVE_DISASSERTED))
                .error_path()
                .message("Error: Elevation Drive did not disassert"),
        )?
        .transition(fallback(DISABLE_TRACKING))
}

fn disable_tracking<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(DISABLE_TRACKING)
        .on_entry(|ctx| ctx.write(MCS_TRACK_DIS, 1))
        .transition(fallback(AZ_ASSERT))
}

fn az_assert<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(AZ_ASSERT)
        .on_entry(|ctx| ctx.write(AZ_DRIVE_EN, DRIVE_ASSERTED))
        .transition(
            guarded(REC_ERROR, [AZ_DRIVE_COND], differs(DRIVE_ASSERTED))
                .error_path()
                .message("Error: Azimuth Drive did not assert"),
        )?
        .transition(fallback(ENABLE_TRACKING))
}

fn enable_tracking<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(ENABLE_TRACKING)
        .on_entry(|ctx| ctx.write(MCS_TRACK_DIS, 0))
        .transition(fallback(EL_ASSERT))
}

fn el_assert<P: PointIo + Clone + 'static>() -> Step<P> {
    State::new(EL_ASSERT)
        .on_entry(|ctx| ctx.write(EL_DRIVE_EN, DRIVE_ASSERTED))
        .transition(
            guarded(REC_ERROR, [EL_DRIVE_COND], differs(DRIVE_ASSERTED))
                .error_path()
                .message("Error: Elevation Drive did not assert"),
        )?
        .transition(fallback(FOLLOW_ON))
}

fn follow_on<P: PointIo + Clone + 'static>(thresholds: &Thresholds) -> Step<P> {
    State::new(FOLLOW_ON)
        .on_entry(|ctx| {
            ctx.write(TCS_MCS_FOLLOW, "On")?;
            ctx.write(TCS_APPLY, APPLY_DIRECTIVES)
        })
        .transition(
            guarded(REC_ERROR, [MCS_FOLLOW], |_, inputs| {
                !inputs.flag(MCS_FOLLOW)
            })
            .error_path()
            .message("Error: Could not disable MCS Tracking"),
        )?
        .transition(guarded(
            REC_SUCCESS,
            [VOLT_AZ, AZ_POS_ERR, VOLT_EL, EL_POS_ERR],
            tracking(thresholds),
        ))?
        .transition(
            guarded(REC_ERROR, [PREV_STATE_INPUT], |_, inputs| {
                inputs.prev_state_is(FOLLOW_OFF)
            })
            .error_path()
            .message("MCS Follow enabled but telescope not tracking"),
        )?
        .transition(fallback(FOLLOW_OFF).message("Resetting MCS Follow mode"))
}

fn rec_success<P: PointIo + Clone + 'static>() -> State<P> {
    State::new(REC_SUCCESS)
        .terminal()
        .on_entry(announce("Non Zero Speed Fault recovery successful"))
}

fn rec_error<P: PointIo + Clone + 'static>() -> State<P> {
    State::new(REC_ERROR).terminal().on_entry(|ctx| {
        ctx.write(MCS_TRACK_DIS, 0)?;
        ctx.report("Non Zero Speed Fault recovery ended in error");
        Ok(())
    })
}
