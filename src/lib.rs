//! # Kinesis
//!
//! Kinesis is the motion-control core for differential-drive robots. It
//! estimates the robot's pose from tracking wheels and a gyro, and drives
//! closed-loop motions on top of that estimate:
//!
//! - **Turns**: turn in place or swing about one side, toward a heading or
//!   a point.
//! - **Point and pose motions**: drive to a point, or to a pose along a
//!   boomerang curve.
//! - **Path following**: pure pursuit over a list of waypoints.
//!
//! The core is hardware-agnostic. Motors, sensors and the scheduler are
//! reached through small traits; enable the `vexide` feature for the VEX V5
//! implementations of all of them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use kinesis::{
//!     drivetrain::Differential,
//!     motion::{chassis::{Chassis, ChassisConfig, MoveToPoseParams}, odom::OdomSensors},
//!     vexide::VexideRuntime,
//! };
//! use vexide::prelude::*;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     let drivetrain = Differential::new(
//!         [
//!             Motor::new(peripherals.port_1, Gearset::Blue, Direction::Reverse),
//!             Motor::new(peripherals.port_2, Gearset::Blue, Direction::Reverse),
//!         ],
//!         [
//!             Motor::new(peripherals.port_3, Gearset::Blue, Direction::Forward),
//!             Motor::new(peripherals.port_4, Gearset::Blue, Direction::Forward),
//!         ],
//!     );
//!     let sensors = OdomSensors::default().with_gyro(InertialSensor::new(peripherals.port_10));
//!
//!     let chassis = Chassis::new(VexideRuntime, drivetrain, ChassisConfig::default(), sensors);
//!     chassis.calibrate().await.expect("calibration failed");
//!     chassis.move_to_pose(24.0, 24.0, 90.0, 3000, MoveToPoseParams::default()).await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`drivetrain`]: Motor groups and the differential drivetrain.
//! - [`motion`]: Pose, odometry, PID, pursuit and the chassis.
//! - [`runtime`]: The scheduling contract.
//! - [`telemetry`]: Controller and sensor fault sinks.
//! - [`fs`]: Logging.

/// Differential drivetrain output.
///
/// Provides the [`Differential`](drivetrain::Differential) struct, the only
/// path by which motions command power.
pub mod drivetrain;

/// Error types.
pub mod error;

/// Filesystem utilities module.
///
/// Contains logging functionality for recording robot telemetry and debug
/// information to the console and a file.
pub mod fs;

/// Autonomous motion control module.
///
/// Provides odometry, feedback control, path following and the chassis
/// that ties them together.
pub mod motion;

/// Clock, sleep and task spawning.
pub mod runtime;

/// Telemetry sinks.
pub mod telemetry;

/// Numeric helpers.
pub mod util;

/// VEX V5 implementations of the device and runtime traits.
#[cfg(feature = "vexide")]
pub mod vexide;
