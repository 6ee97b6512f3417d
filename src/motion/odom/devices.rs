//! Sensor abstractions used by odometry.
//!
//! The odometry engine only ever talks to the [`TrackingSensor`] and [`Gyro`]
//! capability traits. Hardware variants (rotation sensors, optical shaft
//! encoders, drivetrain motor encoders, inertial sensors) each implement
//! them; see [`crate::vexide`] for the V5 adapters.
//!
//! # Example
//!
//! ```ignore
//! use kinesis::motion::odom::devices::{OdomSensors, TrackingWheel, omniwheel};
//! use vexide::prelude::*;
//!
//! // 2.75" wheel, 1:1, 1.5" right of the tracking center
//! let vertical = TrackingWheel::new(
//!     RotationSensor::new(peripherals.port_5, Direction::Forward),
//!     omniwheel::NEW_275,
//!     1.5,
//!     1.0,
//! );
//! let imu = InertialSensor::new(peripherals.port_10);
//!
//! let sensors = OdomSensors::new(Some(vertical), None, None, None).with_gyro(imu);
//! ```

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use crate::{drivetrain::MotorGroup, error::SensorError};

/// Common wheel diameters in inches.
pub mod omniwheel {
    pub const NEW_275: f64 = 2.75;
    pub const OLD_275: f64 = 2.75;
    pub const NEW_325: f64 = 3.25;
    pub const OLD_325: f64 = 3.25;
    pub const NEW_4: f64 = 4.0;
    pub const OLD_4: f64 = 4.18;
}

/// A sensor that reports cumulative shaft rotation.
pub trait TrackingSensor {
    /// Cumulative rotation in radians since the last reset, or `None` if
    /// the device cannot be read.
    fn rotation(&self) -> Option<f64>;

    /// Zeroes the cumulative rotation.
    fn reset(&mut self) -> Result<(), SensorError>;
}

/// A heading sensor.
pub trait Gyro {
    /// Cumulative rotation in radians, counter-clockwise positive, or
    /// `None` if the device cannot be read.
    fn rotation(&self) -> Option<f64>;

    fn is_calibrating(&self) -> bool;

    fn is_calibrated(&self) -> bool;

    /// Starts calibration. The returned future resolves once the device
    /// has accepted the request; completion is observed through
    /// [`Gyro::is_calibrating`].
    fn calibrate(&mut self) -> Pin<Box<dyn Future<Output = Result<(), SensorError>> + '_>>;
}

/// Uses a drivetrain motor group's integrated encoders as a tracking sensor.
#[derive(Clone)]
pub struct MotorEncoder {
    group: Rc<RefCell<dyn MotorGroup>>,
}

impl MotorEncoder {
    pub fn new(group: Rc<RefCell<dyn MotorGroup>>) -> Self { Self { group } }
}

impl TrackingSensor for MotorEncoder {
    fn rotation(&self) -> Option<f64> { self.group.try_borrow().ok()?.position() }

    fn reset(&mut self) -> Result<(), SensorError> {
        self.group
            .try_borrow_mut()
            .map_err(|_| SensorError::Port("motor group busy".into()))?
            .reset_position()
    }
}

/// Where a tracking wheel's readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelKind {
    /// An unpowered wheel with its own encoder.
    Dedicated,
    /// A powered drivetrain wheel read through its motors.
    Drivetrain,
}

/// A wheel whose rotation is converted into travelled distance.
pub struct TrackingWheel {
    sensor:     Box<dyn TrackingSensor>,
    /// The diameter of the wheel in inches.
    pub diameter:   f64,
    /// Perpendicular distance from the tracking center in inches. Vertical
    /// wheels measure it to the right, horizontal wheels forward.
    pub offset:     f64,
    /// Wheel rotations per sensor rotation.
    pub gear_ratio: f64,
    pub kind:       WheelKind,
}

impl TrackingWheel {
    /// Creates a tracking wheel on a dedicated encoder.
    pub fn new(
        sensor: impl TrackingSensor + 'static,
        diameter: f64,
        offset: f64,
        gear_ratio: f64,
    ) -> Self {
        Self {
            sensor: Box::new(sensor),
            diameter,
            offset,
            gear_ratio,
            kind: WheelKind::Dedicated,
        }
    }

    /// Creates a tracking wheel that reads a drivetrain side's motors.
    /// `gear_ratio` is wheel rotations per motor shaft rotation.
    pub fn from_motors(
        group: Rc<RefCell<dyn MotorGroup>>,
        diameter: f64,
        offset: f64,
        gear_ratio: f64,
    ) -> Self {
        Self {
            sensor: Box::new(MotorEncoder::new(group)),
            diameter,
            offset,
            gear_ratio,
            kind: WheelKind::Drivetrain,
        }
    }

    /// Distance travelled in inches since the last reset.
    pub fn distance(&self) -> Option<f64> {
        self.sensor.rotation().map(|r| r * self.gear_ratio * self.diameter / 2.0)
    }

    pub fn reset(&mut self) -> Result<(), SensorError> { self.sensor.reset() }
}

/// The full sensor set handed to the odometry engine.
///
/// Every slot is optional. At calibration time the chassis fills missing
/// vertical wheels from the drivetrain motors.
#[derive(Default)]
pub struct OdomSensors {
    pub vertical1:   Option<TrackingWheel>,
    pub vertical2:   Option<TrackingWheel>,
    pub horizontal1: Option<TrackingWheel>,
    pub horizontal2: Option<TrackingWheel>,
    pub gyro:        Option<Box<dyn Gyro>>,
}

impl OdomSensors {
    pub fn new(
        vertical1: Option<TrackingWheel>,
        vertical2: Option<TrackingWheel>,
        horizontal1: Option<TrackingWheel>,
        horizontal2: Option<TrackingWheel>,
    ) -> Self {
        Self {
            vertical1,
            vertical2,
            horizontal1,
            horizontal2,
            gyro: None,
        }
    }

    /// Adds a heading sensor.
    pub fn with_gyro(mut self, gyro: impl Gyro + 'static) -> Self {
        self.gyro = Some(Box::new(gyro));
        self
    }

    /// Mutable iterator over the wheels that are present.
    pub fn wheels_mut(&mut self) -> impl Iterator<Item = &mut TrackingWheel> {
        [
            self.vertical1.as_mut(),
            self.vertical2.as_mut(),
            self.horizontal1.as_mut(),
            self.horizontal2.as_mut(),
        ]
        .into_iter()
        .flatten()
    }
}
