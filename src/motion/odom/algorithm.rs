//! Tick math for the odometry engine.
//!
//! Arc-corrected dead reckoning, after equation 6 of
//! <http://thepilons.ca/wp-content/uploads/2018/10/Tracking.pdf>: over one
//! short tick the robot is assumed to travel along a circular arc, so the
//! chord `2 * sin(dθ/2) * (d/dθ - offset)` replaces the raw wheel travel.

use crate::motion::pose::Pose;

/// Below this heading change a tick is treated as a straight line.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// Heading change implied by two parallel wheels.
///
/// Returns `None` if the wheels share an offset, since their difference
/// then says nothing about rotation.
pub fn pair_heading(delta1: f64, offset1: f64, delta2: f64, offset2: f64) -> Option<f64> {
    let separation = offset1 - offset2;
    if separation.abs() < STRAIGHT_EPSILON {
        return None;
    }
    Some((delta1 - delta2) / separation)
}

/// Chord travelled by the tracking center along one axis, given the
/// travel of a wheel mounted `offset` away from it.
pub fn local_calc(delta_theta: f64, delta_dist: f64, offset: f64) -> f64 {
    if delta_theta.abs() < STRAIGHT_EPSILON {
        return delta_dist;
    }
    2.0 * (delta_theta / 2.0).sin() * (delta_dist / delta_theta - offset)
}

/// Rotates the vector `(x, y)` counter-clockwise by `t` radians.
pub fn rotate_vec(x: f64, y: f64, t: f64) -> (f64, f64) {
    let (sin, cos) = t.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Local displacement over one tick as `(forward, left)`.
///
/// `vertical` and `horizontal` are `(delta, offset)` pairs for the chosen
/// wheels. A missing horizontal wheel means no sideways travel is
/// measured; a missing vertical wheel means no forward travel is.
pub fn local_displacement(
    delta_theta: f64,
    vertical: Option<(f64, f64)>,
    horizontal: Option<(f64, f64)>,
) -> (f64, f64) {
    let forward = vertical.map_or(0.0, |(d, off)| local_calc(delta_theta, d, off));
    let left = horizontal.map_or(0.0, |(d, off)| local_calc(delta_theta, d, off));
    (forward, left)
}

/// Applies one tick to `pose`.
///
/// The local displacement is rotated by the heading at mid-arc. Returns the
/// new pose and the global displacement.
pub fn integrate(pose: Pose, delta_theta: f64, local: (f64, f64)) -> (Pose, (f64, f64)) {
    let avg_t = pose.theta + delta_theta / 2.0;
    let (dx, dy) = rotate_vec(local.0, local.1, avg_t);
    (Pose::new(pose.x + dx, pose.y + dy, pose.theta + delta_theta), (dx, dy))
}
