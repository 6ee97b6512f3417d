//! Odometry for robot position estimation.
//!
//! This module estimates the robot's global pose from tracking wheels and an
//! optional heading sensor.
//!
//! # Module Structure
//!
//! - **[`devices`]**: Sensor capability traits and tracking wheels.
//! - **[`tracker`]**: The odometry engine and its shared state.
//!
//! # How It Works
//!
//! Odometry uses wheel encoders to measure how far the robot has traveled
//! and a gyro (or a pair of parallel wheels) to measure rotation. Every tick
//! the wheel deltas are turned into an arc-corrected local displacement,
//! rotated into the field frame and added to the pose.
//!
//! A sensor that stops answering, or jumps further than is physically
//! possible in one tick, is left out of that tick. Heading then falls back
//! from the gyro to a horizontal wheel pair, then to a vertical wheel pair,
//! and is held constant if none is left.
//!
//! # Hardware
//!
//! - **Vertical tracking wheels**: measure forward/backward travel. If none
//!   are given the drivetrain motors stand in.
//! - **Horizontal tracking wheels**: measure sideways travel.
//! - **Gyro**: measures rotation directly.

mod algorithm;

/// Sensor traits and tracking wheels.
pub mod devices;

/// The odometry engine.
pub mod tracker;

pub use devices::{Gyro, MotorEncoder, OdomSensors, TrackingSensor, TrackingWheel, WheelKind, omniwheel};
pub use tracker::{FaultLimits, OdomHandle, OdomState, Odometry};
