//! Differential drivetrain output.
//!
//! This module provides the [`Differential`] struct, which owns the left and
//! right motor groups of a tank-style drivetrain and is the only way the
//! motion primitives command power.
//!
//! # Power Range
//!
//! Power is normalized to `[-MAX_POWER, MAX_POWER]`. Every write through
//! [`Differential`] is clamped to that range first, so motor group
//! implementations may assume their input is in range.
//!
//! # Example
//!
//! ```ignore
//! use kinesis::drivetrain::Differential;
//! use vexide::prelude::*;
//!
//! let drivetrain = Differential::new(
//!     [
//!         Motor::new(peripherals.port_1, Gearset::Blue, Direction::Reverse),
//!         Motor::new(peripherals.port_2, Gearset::Blue, Direction::Reverse),
//!     ],
//!     [
//!         Motor::new(peripherals.port_3, Gearset::Blue, Direction::Forward),
//!         Motor::new(peripherals.port_4, Gearset::Blue, Direction::Forward),
//!     ],
//! );
//! ```

use std::{cell::RefCell, rc::Rc};

use log::warn;

use crate::{error::SensorError, util::clamp_abs};

/// Largest power magnitude a side can be commanded.
pub const MAX_POWER: f64 = 127.0;

/// A group of motors driven together as one side of the drivetrain.
pub trait MotorGroup {
    /// Commands every motor in the group. `power` is in `[-MAX_POWER, MAX_POWER]`.
    fn set_power(&mut self, power: f64);

    /// Average shaft rotation of the group in radians, `None` if no motor
    /// in the group can be read.
    fn position(&self) -> Option<f64>;

    /// Zeroes the integrated encoders.
    fn reset_position(&mut self) -> Result<(), SensorError>;
}

/// Drivetrain side selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveSide {
    Left,
    Right,
}

/// A differential drivetrain.
///
/// Both motor groups live in reference-counted cells so the odometry can
/// read their encoders while the motion primitives command them.
#[derive(Clone)]
pub struct Differential {
    /// The left motor group.
    pub left:  Rc<RefCell<dyn MotorGroup>>,
    /// The right motor group.
    pub right: Rc<RefCell<dyn MotorGroup>>,
}

impl Differential {
    /// Creates a new drivetrain from the provided left/right motor groups.
    pub fn new<L: MotorGroup + 'static, R: MotorGroup + 'static>(left: L, right: R) -> Self {
        Self {
            left:  Rc::new(RefCell::new(left)),
            right: Rc::new(RefCell::new(right)),
        }
    }

    /// Commands both sides, clamping each to [`MAX_POWER`].
    pub fn set_power(&self, left: f64, right: f64) {
        Self::write(&self.left, left, DriveSide::Left);
        Self::write(&self.right, right, DriveSide::Right);
    }

    /// Commands zero power to both sides.
    pub fn stop(&self) { self.set_power(0.0, 0.0); }

    fn write(group: &Rc<RefCell<dyn MotorGroup>>, power: f64, side: DriveSide) {
        let power = if power.is_finite() { clamp_abs(power, MAX_POWER) } else { 0.0 };
        match group.try_borrow_mut() {
            Ok(mut motors) => motors.set_power(power),
            Err(_) => warn!("{side:?} motor group busy, dropped power command {power:.1}"),
        }
    }
}
