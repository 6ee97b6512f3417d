//! Numeric helpers shared by odometry and the motion primitives.

use std::f64::consts::{PI, TAU};

/// Wraps an angle in radians to `[0, 2π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Wraps an angle in radians to `(-π, π]`.
pub fn wrap_signed(angle: f64) -> f64 {
    let wrapped = wrap_angle(angle);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Shortest signed rotation, in radians, that takes `current` onto `target`.
///
/// Positive results are counter-clockwise. The magnitude never exceeds π,
/// so a caller driving this error to zero always takes the short way round.
pub fn angle_error(target: f64, current: f64) -> f64 { wrap_signed(target - current) }

/// Sign of `x` as `-1.0`, `0.0` or `1.0`.
pub fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Clamps `val` to `[-cap, cap]`.
pub fn clamp_abs(val: f64, cap: f64) -> f64 {
    let cap = cap.abs();
    val.clamp(-cap, cap)
}

/// Limits how far `target` may move away from `current` in one step.
///
/// A `max_change` of zero disables the limit.
pub fn slew(target: f64, current: f64, max_change: f64) -> f64 {
    if max_change <= 0.0 {
        return target;
    }
    let change = target - current;
    if change > max_change {
        current + max_change
    } else if change < -max_change {
        current - max_change
    } else {
        target
    }
}

/// Arithmetic mean, zero for an empty slice.
pub fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Exponential input-shaping curve for stick input in `[-127, 127]`.
///
/// Larger `t` flattens the response near zero while still reaching full
/// scale at the ends. `t == 0` is the identity.
pub fn drive_curve(input: f64, t: f64) -> f64 {
    ((-t / 10.0).exp() + ((input.abs() - 127.0) / 10.0).exp() * (1.0 - (-t / 10.0).exp())) * input
}
