//! Chassis configuration and per-motion parameters.

use std::time::Duration;

use crate::{
    drivetrain::{DriveSide, MAX_POWER},
    motion::{
        odom::{FaultLimits, omniwheel},
        pid::{ExitConditions, Pid},
    },
};

/// Gains and exit conditions for one class of motion.
///
/// Angular settings work in degrees, lateral settings in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Proportional gain.
    ///
    /// Higher values increase response speed but may cause overshoot.
    /// Start tuning with this value.
    pub kp:                  f64,
    /// Integral gain.
    ///
    /// Helps eliminate steady-state error. Usually left at 0.
    pub ki:                  f64,
    /// Derivative gain.
    ///
    /// Dampens oscillations and reduces overshoot. Add after Kp is tuned.
    pub kd:                  f64,
    /// Largest change in output per loop tick. 0 disables slew.
    pub slew:                f64,
    /// Outer settle band.
    pub large_error:         f64,
    /// Inner settle band.
    pub small_error:         f64,
    /// Dwell in the outer band before settling, in milliseconds.
    pub large_error_timeout: u64,
    /// Dwell in the inner band before settling, in milliseconds.
    pub small_error_timeout: u64,
}

impl ControllerSettings {
    pub fn new(kp: f64, ki: f64, kd: f64, slew: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            slew,
            ..Self::default()
        }
    }

    /// Same settings with different settle bands.
    pub fn with_exit(
        mut self,
        large_error: f64,
        small_error: f64,
        large_error_timeout: u64,
        small_error_timeout: u64,
    ) -> Self {
        self.large_error = large_error;
        self.small_error = small_error;
        self.large_error_timeout = large_error_timeout;
        self.small_error_timeout = small_error_timeout;
        self
    }

    pub fn exit_conditions(&self, timeout: u64) -> ExitConditions {
        ExitConditions::new(
            self.large_error,
            self.small_error,
            self.large_error_timeout,
            self.small_error_timeout,
            timeout,
        )
    }

    /// A fresh controller that gives up after `timeout` milliseconds.
    pub fn controller(&self, timeout: u64) -> Pid { Pid::new(self.kp, self.ki, self.kd, self.exit_conditions(timeout)) }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            kp:                  1.0,
            ki:                  0.0,
            kd:                  0.0,
            slew:                0.0,
            large_error:         3.0,
            small_error:         1.0,
            large_error_timeout: 500,
            small_error_timeout: 100,
        }
    }
}

/// The chassis' physical configuration and tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ChassisConfig {
    /// The width from the right wheels to the left, in inches.
    pub track_width:         f64,
    /// Drive wheel diameter in inches.
    /// Most teams use 2.75", 3.25" or sometimes 4".
    pub wheel_diameter:      f64,
    /// Drive wheel rotations per motor shaft rotation.
    pub drive_gear_ratio:    f64,
    /// Settings for driving toward a point.
    pub lateral:             ControllerSettings,
    /// Settings for turning.
    pub angular:             ControllerSettings,
    /// Distance to the target, in inches, at which point and pose motions
    /// stop steering and commit to the final approach.
    pub close_radius:        f64,
    /// Lowest speed ceiling used during the final approach.
    pub close_min_speed:     f64,
    /// Motion loop period.
    pub loop_period:         Duration,
    /// Odometry tick period.
    pub odom_period:         Duration,
    /// How long the gyro may report calibrating before giving up.
    pub calibration_timeout: Duration,
    /// Sensor plausibility limits for odometry.
    pub fault_limits:        FaultLimits,
}

impl ChassisConfig {
    pub fn new(
        track_width: f64,
        wheel_diameter: f64,
        drive_gear_ratio: f64,
        lateral: ControllerSettings,
        angular: ControllerSettings,
    ) -> Self {
        Self {
            track_width,
            wheel_diameter,
            drive_gear_ratio,
            lateral,
            angular,
            ..Self::default()
        }
    }
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            track_width:         12.0,
            wheel_diameter:      omniwheel::NEW_325,
            drive_gear_ratio:    0.75,
            lateral:             ControllerSettings::new(10.0, 0.0, 30.0, 5.0).with_exit(3.0, 1.0, 500, 100),
            angular:             ControllerSettings::new(2.0, 0.0, 10.0, 0.0).with_exit(3.0, 1.0, 500, 100),
            close_radius:        7.5,
            close_min_speed:     30.0,
            loop_period:         Duration::from_millis(10),
            odom_period:         Duration::from_millis(10),
            calibration_timeout: Duration::from_millis(3000),
            fault_limits:        FaultLimits::default(),
        }
    }
}

/// Parameters for [`turn_to_heading`](super::Chassis::turn_to_heading) and
/// [`turn_to_point`](super::Chassis::turn_to_point).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnParams {
    pub max_speed: f64,
    /// Face away from the target instead of toward it.
    pub reversed:  bool,
    /// Send controller samples to telemetry.
    pub log:       bool,
}

impl Default for TurnParams {
    fn default() -> Self {
        Self {
            max_speed: MAX_POWER,
            reversed:  false,
            log:       false,
        }
    }
}

/// Parameters for swing turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingParams {
    /// Side that is powered. `None` picks the side that turns the robot
    /// toward the target: right for counter-clockwise, left for clockwise.
    pub side:      Option<DriveSide>,
    pub max_speed: f64,
    pub reversed:  bool,
    pub log:       bool,
}

impl Default for SwingParams {
    fn default() -> Self {
        Self {
            side:      None,
            max_speed: MAX_POWER,
            reversed:  false,
            log:       false,
        }
    }
}

/// Parameters for [`move_to_point`](super::Chassis::move_to_point).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveToPointParams {
    /// `Some(true)` drives forward, `Some(false)` backward, `None` whichever
    /// needs less rotation.
    pub forwards:  Option<bool>,
    pub max_speed: f64,
    pub log:       bool,
}

impl Default for MoveToPointParams {
    fn default() -> Self {
        Self {
            forwards:  None,
            max_speed: MAX_POWER,
            log:       false,
        }
    }
}

/// Parameters for [`move_to_pose`](super::Chassis::move_to_pose).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveToPoseParams {
    /// Carrot distance as a fraction of the distance to the target.
    /// Higher values swing wider. Keep within `0.0..1.0`.
    pub lead:      f64,
    pub max_speed: f64,
    /// The motion runs at least this long even if it settles earlier.
    pub min_time:  Duration,
    pub log:       bool,
}

impl Default for MoveToPoseParams {
    fn default() -> Self {
        Self {
            lead:      0.6,
            max_speed: MAX_POWER,
            min_time:  Duration::from_millis(300),
            log:       false,
        }
    }
}

/// Parameters for [`follow`](super::Chassis::follow).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitParams {
    pub max_speed:  f64,
    /// Floor for the commanded speed so the robot does not stall short
    /// of the end.
    pub min_speed:  f64,
    /// Speed per inch of remaining path. Sets how early the robot slows.
    pub decel_gain: f64,
    /// Drive the path backward.
    pub reversed:   bool,
    pub log:        bool,
}

impl Default for PursuitParams {
    fn default() -> Self {
        Self {
            max_speed:  MAX_POWER,
            min_speed:  20.0,
            decel_gain: 6.0,
            reversed:   false,
            log:        false,
        }
    }
}
