//! End-to-end recovery runs against the simulated mount.
//!
//! Every test runs on a paused tokio clock, so the 90 second error
//! timeout elapses instantly while remaining exact.

use nzsf::builder::{fallback, ConfigError, StateMachineBuilder};
use nzsf::config::RecoveryConfig;
use nzsf::core::Value;
use nzsf::effects::{ExecutionContext, State};
use nzsf::observe::RecordingObserver;
use nzsf::recovery::points::*;
use nzsf::recovery::states::*;
use nzsf::recovery::{recovery_context, recovery_machine, Scenario, SimulatedMount};
use nzsf::RecoveryOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const ERROR_TIMEOUT: Duration = Duration::from_secs(90);

struct Run {
    outcome: RecoveryOutcome,
    lines: Vec<String>,
    elapsed: Duration,
}

impl Run {
    fn path(&self) -> Vec<String> {
        self.outcome
            .history
            .get_path()
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect()
    }
}

fn context(
    mount: &SimulatedMount,
    observer: &RecordingObserver,
) -> ExecutionContext<SimulatedMount> {
    recovery_context(mount.clone()).with_observer(Arc::new(observer.clone()))
}

async fn run(mount: &SimulatedMount) -> Run {
    let machine = recovery_machine(&RecoveryConfig::default()).unwrap();
    let observer = RecordingObserver::new();
    let mut ctx = context(mount, &observer);

    let started = Instant::now();
    let outcome = machine.run(&mut ctx).await;

    Run {
        outcome,
        lines: observer.lines(),
        elapsed: started.elapsed(),
    }
}

#[tokio::test(start_paused = true)]
async fn cleared_faults_end_in_no_fault() {
    let mount = Scenario::NoFault.mount();

    let run = run(&mount).await;

    assert!(run.outcome.ended_on(NO_FAULT));
    assert_eq!(run.path(), vec![START, NO_FAULT]);
    assert!(mount.commands().is_empty());
    assert_eq!(run.elapsed, Duration::ZERO);
    assert_eq!(
        run.lines,
        vec![
            "Initiating Non Zero Speed Fault Recovery",
            "Recovery in NO_FAULT state",
            "Non Zero Speed Fault not present, ending sequence",
            "Recovery ended on NO_FAULT",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn nominal_recovery_succeeds() {
    let mount = Scenario::Nominal.mount();

    let run = run(&mount).await;

    assert!(run.outcome.ended_on(REC_SUCCESS));
    assert_eq!(
        run.path(),
        vec![
            START,
            FOLLOW_OFF,
            VOLTAGE_ZERO,
            CLEAR_NZSF,
            FAULT_CLEARED,
            AZ_DISASSERT,
            EL_DISASSERT,
            DISABLE_TRACKING,
            AZ_ASSERT,
            ENABLE_TRACKING,
            EL_ASSERT,
            FOLLOW_ON,
            REC_SUCCESS,
        ]
    );
    assert_eq!(run.outcome.history.escalations().count(), 0);
    assert!(run.elapsed < Duration::from_secs(1));
    assert_eq!(
        mount.commanded(TCS_MCS_FOLLOW),
        vec![Value::from("Off"), Value::from("On")]
    );
    assert_eq!(mount.commanded(MCS_TRACK_DIS), vec![Value::from(1), Value::from(0)]);
    assert_eq!(run.lines.last().map(String::as_str), Some("Recovery ended on REC_SUCCESS"));
    assert!(run.lines.contains(&"Recovery in FOLLOW_OFF state".to_string()));
}

#[tokio::test(start_paused = true)]
async fn follow_mode_dropping_late_still_avoids_rec_error() {
    let mount = Scenario::StuckFollow.mount();
    let operator = mount.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(30)).await;
        operator.release(MCS_FOLLOW);
        operator.set(MCS_FOLLOW, 0);
    });

    let run = run(&mount).await;

    let path = run.path();
    assert_eq!(&path[..3], [START, FOLLOW_OFF, VOLTAGE_ZERO]);
    let left_follow_off = &run.outcome.history.transitions()[1];
    assert!(!left_follow_off.error_path);
    assert!(left_follow_off.waited >= Duration::from_secs(30));
    assert!(left_follow_off.waited < ERROR_TIMEOUT);
    assert!(run.outcome.ended_on(REC_SUCCESS));
}

#[tokio::test(start_paused = true)]
async fn follow_mode_stuck_on_escalates_to_rec_error() {
    let mount = Scenario::StuckFollow.mount();

    let run = run(&mount).await;

    assert!(run.outcome.ended_on(REC_ERROR));
    assert_eq!(run.path(), vec![START, FOLLOW_OFF, REC_ERROR]);

    let escalation = &run.outcome.history.transitions()[1];
    assert!(escalation.error_path);
    assert!(escalation.waited > ERROR_TIMEOUT);
    assert!(escalation.waited <= ERROR_TIMEOUT + Duration::from_millis(50));

    assert_eq!(mount.commanded(MCS_TRACK_DIS), vec![Value::from(0)]);
    assert!(run
        .lines
        .contains(&"Error: Could not disable MCS Tracking".to_string()));
    assert_eq!(run.lines.last().map(String::as_str), Some("Recovery ended on REC_ERROR"));
}

#[tokio::test(start_paused = true)]
async fn azimuth_drive_is_released_before_elevation() {
    let mount = Scenario::Nominal.mount();

    let run = run(&mount).await;

    let path = run.path();
    let cleared = path.iter().position(|s| s == FAULT_CLEARED).unwrap();
    assert_eq!(path[cleared + 1], AZ_DISASSERT);
    assert_eq!(
        mount.commanded(AZ_DRIVE_EN)[0],
        Value::from(DRIVE_DISASSERTED)
    );
}

#[tokio::test(start_paused = true)]
async fn voltage_that_will_not_zero_escalates() {
    let mount = Scenario::StuckVoltage.mount();

    let run = run(&mount).await;

    assert_eq!(run.path(), vec![START, FOLLOW_OFF, VOLTAGE_ZERO, REC_ERROR]);
    assert!(run
        .lines
        .contains(&"Error: Unable to zero reference voltage".to_string()));
    assert!(run.elapsed > ERROR_TIMEOUT + Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn drive_that_will_not_disassert_escalates() {
    let mount = Scenario::DriveFault.mount();

    let run = run(&mount).await;

    assert_eq!(run.path().last().map(String::as_str), Some(REC_ERROR));
    assert_eq!(run.path()[run.path().len() - 2], AZ_DISASSERT);
    assert!(run
        .lines
        .contains(&"Error: Azimuth Drive did not disassert".to_string()));
}

#[tokio::test(start_paused = true)]
async fn lost_tracking_retries_follow_mode_once() {
    let mount = Scenario::TrackingLost.mount();

    let run = run(&mount).await;

    let path = run.path();
    assert_eq!(
        &path[path.len() - 4..],
        [FOLLOW_ON, FOLLOW_OFF, FOLLOW_ON, REC_ERROR]
    );
    assert_eq!(run.outcome.history.escalations().count(), 1);
    assert!(run.lines.contains(&"Resetting MCS Follow mode".to_string()));
    assert!(run
        .lines
        .contains(&"MCS Follow enabled but telescope not tracking".to_string()));
    assert_eq!(
        mount.commanded(TCS_MCS_FOLLOW),
        vec![
            Value::from("Off"),
            Value::from("On"),
            Value::from("Off"),
            Value::from("On"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn shorter_error_timeout_is_honoured() {
    let mut config = RecoveryConfig::default();
    config.engine.error_timeout_secs = 5.0;
    let mount = Scenario::StuckFollow.mount();
    let machine = recovery_machine(&config).unwrap();
    let observer = RecordingObserver::new();
    let mut ctx = context(&mount, &observer);

    let started = Instant::now();
    let outcome = machine.run(&mut ctx).await;

    assert!(outcome.ended_on(REC_ERROR));
    assert!(started.elapsed() > Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
}

#[test]
fn two_start_states_fail_before_running() {
    let result = StateMachineBuilder::<SimulatedMount>::new()
        .state(State::new("first").start().transition(fallback("end")).unwrap())
        .state(State::new("second").start().transition(fallback("end")).unwrap())
        .state(State::new("end").terminal())
        .build();

    let error = result.err().unwrap();
    assert!(error.contains(&ConfigError::MultipleStartStates {
        names: vec!["first".to_string(), "second".to_string()],
    }));
}
