//! Logical point names used by the recovery procedure.
//!
//! These are the names guards and handlers use. Binding them to real
//! control-system channels is the job of the [`PointIo`](crate::effects::PointIo)
//! implementation.

/// Azimuth non-zero-speed fault summary.
pub const NZS_AZ: &str = "nzsAz";
/// Elevation non-zero-speed fault summary.
pub const NZS_EL: &str = "nzsEl";
/// Azimuth drive voltage set-point.
pub const VOLT_AZ: &str = "voltAz";
/// Elevation drive voltage set-point.
pub const VOLT_EL: &str = "voltEl";
/// Mount control system follow mode.
pub const MCS_FOLLOW: &str = "mcsFollow";
/// Azimuth drive condition: 1 disasserted, 2 asserted.
pub const AZ_DRIVE_COND: &str = "azDriveCond";
/// Elevation drive condition: 1 disasserted, 2 asserted.
pub const EL_DRIVE_COND: &str = "elDriveCond";
pub const AZ_POS_ERR: &str = "azPosErr";
pub const EL_POS_ERR: &str = "elPosErr";

/// Follow directive sent to the telescope control system ("On"/"Off").
pub const TCS_MCS_FOLLOW: &str = "tcsMCSFollow";
/// Apply directive; 3 applies pending directives.
pub const TCS_APPLY: &str = "tcsApply";
/// Fault reset pulse.
pub const F1_RESET: &str = "f1Reset";
pub const E_STOP: &str = "eStop";
/// Disables the mount's ability to enter follow mode.
pub const MCS_TRACK_DIS: &str = "mcsTrackDis";
/// Azimuth drive enable: 1 disassert, 2 assert.
pub const AZ_DRIVE_EN: &str = "azDriveEn";
/// Elevation drive enable: 1 disassert, 2 assert.
pub const EL_DRIVE_EN: &str = "elDriveEn";

pub const INPUTS: [&str; 9] = [
    NZS_AZ,
    NZS_EL,
    VOLT_AZ,
    VOLT_EL,
    MCS_FOLLOW,
    AZ_DRIVE_COND,
    EL_DRIVE_COND,
    AZ_POS_ERR,
    EL_POS_ERR,
];

pub const OUTPUTS: [&str; 7] = [
    TCS_MCS_FOLLOW,
    TCS_APPLY,
    F1_RESET,
    E_STOP,
    MCS_TRACK_DIS,
    AZ_DRIVE_EN,
    EL_DRIVE_EN,
];

/// Value written to `tcsApply` to apply pending directives.
pub const APPLY_DIRECTIVES: i32 = 3;
pub const DRIVE_DISASSERTED: i32 = 1;
pub const DRIVE_ASSERTED: i32 = 2;
