//! Feedback control for the motion primitives.
//!
//! # How PID Works
//!
//! The controller calculates an output from the error between a target and
//! the current value:
//!
//! - **P (Proportional)**: output proportional to the error.
//! - **I (Integral)**: output proportional to accumulated error over time.
//! - **D (Derivative)**: output proportional to the rate of error change.
//!
//! The formula is: `output = Kp*error + Ki*integral + Kd*derivative`
//!
//! # Tuning
//!
//! Start with Kp and increase until the robot reaches the target.
//! Add Kd to reduce overshoot. Only add Ki if the robot consistently
//! undershoots.
//!
//! Angular controllers are fed errors in degrees and lateral controllers
//! errors in inches, so gains tuned for one do not transfer to the other.

/// The PID controller.
pub mod controller;

/// Dual-band settle detection.
pub mod settle;

pub use controller::Pid;
pub use settle::{ExitConditions, SettleDetector, SettleReason, SettleState};
