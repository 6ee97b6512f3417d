//! VEX V5 implementations of the device and runtime traits.
//!
//! Enabled by the `vexide` feature.
//!
//! - Motor arrays and vectors are [`MotorGroup`]s; power is mapped linearly
//!   onto ±12 V.
//! - Rotation sensors and ADI optical encoders are [`TrackingSensor`]s.
//! - The inertial sensor is a [`Gyro`], with its clockwise rotation flipped
//!   to counter-clockwise positive.
//! - [`VexideRuntime`] schedules on the vexide executor and reads the
//!   competition mode.
//!
//! Device errors are logged with `warn!` and reported as missing readings,
//! which odometry then treats as a sensor fault.

use std::{future::Future, pin::Pin, time::Duration};

use ::vexide::{
    adi::encoder::AdiOpticalEncoder,
    competition::{self, CompetitionMode},
    smart::{imu::InertialSensor, motor::Motor, rotation::RotationSensor},
};
use log::warn;

use crate::{
    drivetrain::{MAX_POWER, MotorGroup},
    error::SensorError,
    motion::odom::{Gyro, TrackingSensor},
    runtime::{RunState, Runtime},
};

/// Motor voltage at full power.
const MAX_VOLTAGE: f64 = 12.0;

fn set_power(motors: &mut [Motor], power: f64) {
    let voltage = power / MAX_POWER * MAX_VOLTAGE;
    for motor in motors.iter_mut() {
        let _ = motor.set_voltage(voltage);
    }
}

fn position(motors: &[Motor]) -> Option<f64> {
    let readings: Vec<f64> = motors
        .iter()
        .filter_map(|motor| match motor.position() {
            Ok(angle) => Some(angle.as_radians()),
            Err(e) => {
                warn!("Motor Position Error: {}", e);
                None
            }
        })
        .collect();
    if readings.is_empty() { None } else { Some(crate::util::avg(&readings)) }
}

fn reset_position(motors: &mut [Motor]) -> Result<(), SensorError> {
    for motor in motors.iter_mut() {
        motor.reset_position().map_err(|e| SensorError::Port(e.to_string()))?;
    }
    Ok(())
}

impl<const N: usize> MotorGroup for [Motor; N] {
    fn set_power(&mut self, power: f64) { set_power(self, power) }

    fn position(&self) -> Option<f64> { position(self) }

    fn reset_position(&mut self) -> Result<(), SensorError> { reset_position(self) }
}

impl MotorGroup for Vec<Motor> {
    fn set_power(&mut self, power: f64) { set_power(self, power) }

    fn position(&self) -> Option<f64> { position(self) }

    fn reset_position(&mut self) -> Result<(), SensorError> { reset_position(self) }
}

impl TrackingSensor for RotationSensor {
    fn rotation(&self) -> Option<f64> {
        self.position()
            .map_err(|e| warn!("Rotation Sensor Position Error: {}", e))
            .ok()
            .map(|angle| angle.as_radians())
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        self.reset_position().map_err(|e| SensorError::Port(e.to_string()))
    }
}

impl TrackingSensor for AdiOpticalEncoder {
    fn rotation(&self) -> Option<f64> {
        self.position()
            .map_err(|e| warn!("ADI Optical Encoder Position Error: {}", e))
            .ok()
            .map(|angle| angle.as_radians())
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        self.reset_position().map_err(|e| SensorError::Port(e.to_string()))
    }
}

impl Gyro for InertialSensor {
    fn rotation(&self) -> Option<f64> {
        InertialSensor::rotation(self)
            .map_err(|e| warn!("Inertial Sensor Error: {}", e))
            .ok()
            .map(|angle| -angle.as_radians())
    }

    fn is_calibrating(&self) -> bool {
        InertialSensor::is_calibrating(self).unwrap_or_else(|e| {
            warn!("IMU Calibration State Error: {}", e);
            false
        })
    }

    fn is_calibrated(&self) -> bool { !Gyro::is_calibrating(self) && InertialSensor::rotation(self).is_ok() }

    fn calibrate(&mut self) -> Pin<Box<dyn Future<Output = Result<(), SensorError>> + '_>> {
        Box::pin(async move {
            InertialSensor::calibrate(self)
                .await
                .map_err(|e| SensorError::Port(e.to_string()))
        })
    }
}

/// [`Runtime`] on the vexide executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct VexideRuntime;

impl Runtime for VexideRuntime {
    fn now(&self) -> Duration { ::vexide::time::user_uptime() }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> { ::vexide::time::sleep(duration) }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) { ::vexide::task::spawn(task).detach(); }

    fn run_state(&self) -> RunState {
        match competition::mode() {
            CompetitionMode::Disabled => RunState::Disabled,
            CompetitionMode::Autonomous => RunState::Autonomous,
            CompetitionMode::Driver => RunState::Driver,
        }
    }
}
