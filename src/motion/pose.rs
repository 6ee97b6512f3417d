//! 2D pose type.
//!
//! A [`Pose`] is an (x, y) position in inches plus a heading in radians.
//! The heading is measured from the +x axis and grows counter-clockwise.
//! It is not kept in any fixed range; use [`Pose::normalized`] or the
//! helpers in [`crate::util`] before comparing headings.

use std::ops::{Add, Mul, Sub};

use crate::util::wrap_angle;

/// A 2D position with heading.
///
/// # Example
///
/// ```
/// use kinesis::motion::pose::Pose;
///
/// let a = Pose::origin();
/// let b = Pose::new(3.0, 4.0, 0.0);
/// assert_eq!(a.distance_to(&b), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// The x-coordinate in inches.
    pub x:     f64,
    /// The y-coordinate in inches.
    pub y:     f64,
    /// The heading in radians.
    pub theta: f64,
}

impl Pose {
    /// Creates a new Pose with the specified position and heading (radians).
    pub fn new(x: f64, y: f64, theta: f64) -> Self { Self { x, y, theta } }

    /// Creates a new Pose with the heading given in degrees.
    pub fn from_degrees(x: f64, y: f64, degrees: f64) -> Self {
        Self::new(x, y, degrees.to_radians())
    }

    /// Creates a Pose at the origin (0, 0) with heading 0.
    pub fn origin() -> Self { Self::default() }

    /// Euclidean distance between the two positions. Headings are ignored.
    pub fn distance_to(&self, other: &Pose) -> f64 { (other.x - self.x).hypot(other.y - self.y) }

    /// Bearing from this position to `other`, in radians from +x,
    /// counter-clockwise positive. Headings are ignored.
    pub fn angle_to(&self, other: &Pose) -> f64 { (other.y - self.y).atan2(other.x - self.x) }

    /// Unit vector along this pose's heading, as a pose with zero heading.
    pub fn heading_vector(&self) -> Pose { Pose::new(self.theta.cos(), self.theta.sin(), 0.0) }

    /// Same pose with a different heading.
    pub fn with_theta(&self, theta: f64) -> Pose { Pose::new(self.x, self.y, theta) }

    /// Same pose with the heading wrapped to `[0, 2π)`.
    pub fn normalized(&self) -> Pose { self.with_theta(wrap_angle(self.theta)) }

    /// Heading in degrees.
    pub fn theta_degrees(&self) -> f64 { self.theta.to_degrees() }
}

impl Add for Pose {
    type Output = Pose;

    fn add(self, rhs: Pose) -> Pose { Pose::new(self.x + rhs.x, self.y + rhs.y, self.theta + rhs.theta) }
}

impl Sub for Pose {
    type Output = Pose;

    fn sub(self, rhs: Pose) -> Pose { Pose::new(self.x - rhs.x, self.y - rhs.y, self.theta - rhs.theta) }
}

impl Mul<f64> for Pose {
    type Output = Pose;

    /// Scales the position only.
    fn mul(self, rhs: f64) -> Pose { Pose::new(self.x * rhs, self.y * rhs, self.theta) }
}
