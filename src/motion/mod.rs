//! Autonomous motion control.
//!
//! This module provides tools for precise robot movement during autonomous
//! periods. It includes:
//!
//! - **Pose**: The 2D pose type used throughout.
//! - **Odometry**: Position tracking using tracking wheels and a gyro.
//! - **PID Control**: The feedback controller and settle detection.
//! - **Path Following**: Pure pursuit geometry.
//! - **Chassis**: The motions themselves.
//!
//! # Architecture
//!
//! Odometry runs as a background task that publishes the pose every tick.
//! Each motion is an `async fn` on [`chassis::Chassis`] running its own
//! control loop, which reads that pose, computes an error, feeds it to one
//! or two [`pid::Pid`] controllers and commands the drivetrain, then sleeps
//! for one tick. Only one motion drives at a time.
//!
//! # Example
//!
//! ```ignore
//! use kinesis::motion::chassis::{MoveToPointParams, TurnParams};
//!
//! chassis.calibrate().await?;
//!
//! chassis.move_to_point(0.0, 24.0, 2000, MoveToPointParams::default()).await;
//! chassis.turn_to_heading(90.0, 1000, TurnParams::default()).await;
//! ```

/// The chassis and its motions.
pub mod chassis;

/// Odometry tracking for position estimation.
pub mod odom;

/// Feedback control.
pub mod pid;

/// 2D pose type.
pub mod pose;

/// Pure pursuit path geometry.
pub mod pursuit;
