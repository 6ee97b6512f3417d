//! The chassis: odometry plus closed-loop motions on a differential drive.
//!
//! [`Chassis`] owns the drivetrain, the sensors and the odometry state, and
//! exposes every motion as an `async fn` that returns once the motion has
//! settled, timed out, or been cancelled. The caller cannot tell those
//! apart; read the pose afterward to decide what to do next.
//!
//! # Cancellation
//!
//! Starting a motion bumps a generation counter. A running motion compares
//! its own generation against the counter every tick and exits on a
//! mismatch, so a new motion takes over without waiting for the old one.
//! A change of [`RunState`] has the same effect. Every motion commands zero
//! power on the way out.
//!
//! # Example
//!
//! ```ignore
//! use kinesis::motion::chassis::{Chassis, ChassisConfig, MoveToPoseParams, TurnParams};
//!
//! let chassis = Chassis::new(VexideRuntime, drivetrain, ChassisConfig::default(), sensors);
//! chassis.calibrate().await?;
//!
//! chassis.turn_to_heading(90.0, 1000, TurnParams::default()).await;
//! chassis.move_to_pose(24.0, 24.0, 0.0, 3000, MoveToPoseParams::default()).await;
//! ```

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use log::{info, warn};

use crate::{
    drivetrain::{Differential, MAX_POWER},
    error::ChassisError,
    motion::{
        odom::{OdomHandle, OdomSensors, OdomState, Odometry, TrackingWheel},
        pose::Pose,
    },
    runtime::{RunState, Runtime},
    telemetry::{LogTelemetry, Telemetry},
};

mod config;
mod follow;
mod lateral;
mod turn;

pub use config::{
    ChassisConfig, ControllerSettings, MoveToPointParams, MoveToPoseParams, PursuitParams, SwingParams, TurnParams,
};
pub use lateral::carrot_point;

/// A differential-drive robot with odometry.
pub struct Chassis<R: Runtime> {
    runtime:    R,
    drivetrain: Differential,
    config:     ChassisConfig,
    sensors:    RefCell<Option<OdomSensors>>,
    odom:       OdomHandle,
    generation: Arc<AtomicU32>,
    in_motion:  Cell<Option<u32>>,
    telemetry:  Rc<dyn Telemetry>,
    calibrated: Cell<bool>,
}

impl<R: Runtime> Chassis<R> {
    /// Creates a chassis at the origin. Nothing moves and odometry does not
    /// run until [`Chassis::calibrate`] succeeds.
    pub fn new(runtime: R, drivetrain: Differential, config: ChassisConfig, sensors: OdomSensors) -> Self {
        Self {
            runtime,
            drivetrain,
            config,
            sensors: RefCell::new(Some(sensors)),
            odom: OdomHandle::default(),
            generation: Arc::new(AtomicU32::new(0)),
            in_motion: Cell::new(None),
            telemetry: Rc::new(LogTelemetry),
            calibrated: Cell::new(false),
        }
    }

    /// Replaces the telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Rc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &ChassisConfig { &self.config }

    pub fn drivetrain(&self) -> &Differential { &self.drivetrain }

    pub fn is_calibrated(&self) -> bool { self.calibrated.get() }

    /// Calibrates the sensors and starts odometry.
    ///
    /// Vertical tracking wheels that were not supplied are filled in from
    /// the drivetrain motors. On error the sensors are kept, so this may be
    /// called again.
    pub async fn calibrate(&self) -> Result<(), ChassisError> {
        if self.calibrated.get() {
            return Err(ChassisError::AlreadyCalibrated);
        }
        let Some(mut sensors) = self.sensors.borrow_mut().take() else {
            // another call is mid-calibration
            return Err(ChassisError::AlreadyCalibrated);
        };

        if let Err(e) = self.prepare(&mut sensors).await {
            warn!("calibration failed: {e}");
            *self.sensors.borrow_mut() = Some(sensors);
            return Err(e);
        }

        let odom = Odometry::new(sensors, self.odom.clone(), self.config.fault_limits, self.telemetry.clone());
        self.runtime.spawn(odom.run(self.runtime.clone(), self.config.odom_period));
        self.calibrated.set(true);
        info!("chassis calibrated");
        Ok(())
    }

    async fn prepare(&self, sensors: &mut OdomSensors) -> Result<(), ChassisError> {
        if let Some(gyro) = sensors.gyro.as_mut() {
            gyro.calibrate().await?;
            let start = self.runtime.now();
            while gyro.is_calibrating() {
                if self.runtime.now().saturating_sub(start) >= self.config.calibration_timeout {
                    return Err(ChassisError::CalibrationTimeout(
                        self.config.calibration_timeout.as_millis() as u64,
                    ));
                }
                self.runtime.sleep(self.config.loop_period).await;
            }
            if !gyro.is_calibrated() {
                return Err(ChassisError::NotCalibrated);
            }
        }

        let half = self.config.track_width / 2.0;
        let (diameter, ratio) = (self.config.wheel_diameter, self.config.drive_gear_ratio);
        if sensors.vertical1.is_none() {
            sensors.vertical1 = Some(TrackingWheel::from_motors(self.drivetrain.left.clone(), diameter, -half, ratio));
        }
        if sensors.vertical2.is_none() {
            sensors.vertical2 = Some(TrackingWheel::from_motors(self.drivetrain.right.clone(), diameter, half, ratio));
        }
        for wheel in sensors.wheels_mut() {
            wheel.reset().unwrap_or_else(|e| warn!("tracking wheel reset failed: {e}"));
        }
        Ok(())
    }

    /// Current pose, heading in radians.
    pub fn pose(&self) -> Pose { self.odom.pose() }

    /// Current pose with the heading in degrees.
    pub fn pose_degrees(&self) -> Pose {
        let pose = self.pose();
        pose.with_theta(pose.theta_degrees())
    }

    /// Overwrites the pose. `heading` is in degrees.
    pub fn set_pose(&self, x: f64, y: f64, heading: f64) { self.odom.set_pose(Pose::from_degrees(x, y, heading)); }

    /// Full odometry snapshot.
    pub fn state(&self) -> OdomState { self.odom.snapshot() }

    /// Global velocity in in/s, angular velocity in rad/s as `theta`.
    pub fn speed(&self) -> Pose { self.odom.snapshot().velocity }

    /// Robot-frame velocity as (forward, left, angular).
    pub fn local_speed(&self) -> Pose { self.odom.snapshot().local_velocity }

    /// Where the robot will be in `seconds` if its velocity holds.
    pub fn estimate_pose(&self, seconds: f64) -> Pose {
        let s = self.odom.snapshot();
        Pose::new(
            s.pose.x + s.velocity.x * seconds,
            s.pose.y + s.velocity.y * seconds,
            s.pose.theta + s.velocity.theta * seconds,
        )
    }

    /// Makes every running motion exit on its next tick.
    pub fn cancel_all_motions(&self) { self.generation.fetch_add(1, Ordering::SeqCst); }

    pub fn is_in_motion(&self) -> bool { self.in_motion.get().is_some() }

    /// Claims the drivetrain for a new motion, preempting any running one.
    fn begin(&self, name: &str, timeout: u64) -> Option<MotionGuard<'_, R>> {
        if !self.calibrated.get() {
            warn!("{name} requested before calibration, ignoring");
            return None;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        self.in_motion.set(Some(generation));
        info!("{name} started, timeout {timeout}ms");
        Some(MotionGuard {
            chassis: self,
            generation,
            run_state: self.runtime.run_state(),
            start: self.runtime.now(),
        })
    }

    async fn tick(&self) { self.runtime.sleep(self.config.loop_period).await; }

    /// Commands both sides after scaling them down together so neither
    /// exceeds `max_speed`.
    fn drive(&self, left: f64, right: f64, max_speed: f64) {
        let (left, right) = ratio(left, right, max_speed);
        self.drivetrain.set_power(left, right);
    }
}

/// Scales `(left, right)` so the larger magnitude is at most `max`,
/// keeping their ratio.
pub(crate) fn ratio(left: f64, right: f64, max: f64) -> (f64, f64) {
    let max = max.abs().min(MAX_POWER);
    let peak = left.abs().max(right.abs());
    if peak > max {
        let scale = max / peak;
        (left * scale, right * scale)
    } else {
        (left, right)
    }
}

/// Ownership of the drivetrain for one motion.
///
/// Dropping it commands zero power, so every exit path stops the robot.
struct MotionGuard<'a, R: Runtime> {
    chassis:    &'a Chassis<R>,
    generation: u32,
    run_state:  RunState,
    start:      Duration,
}

impl<R: Runtime> MotionGuard<'_, R> {
    /// False once a newer motion started or the run state changed.
    fn active(&self) -> bool {
        self.chassis.generation.load(Ordering::SeqCst) == self.generation
            && self.chassis.runtime.run_state() == self.run_state
    }

    fn now(&self) -> Duration { self.chassis.runtime.now() }

    fn elapsed(&self) -> Duration { self.now().saturating_sub(self.start) }
}

impl<R: Runtime> Drop for MotionGuard<'_, R> {
    fn drop(&mut self) {
        self.chassis.drivetrain.stop();
        if self.chassis.in_motion.get() == Some(self.generation) {
            self.chassis.in_motion.set(None);
        }
    }
}
