//! Point and pose convergence.

use std::f64::consts::PI;

use log::debug;

use super::{Chassis, MoveToPointParams, MoveToPoseParams};
use crate::{
    motion::pose::Pose,
    runtime::Runtime,
    util::{angle_error, clamp_abs, sgn, slew},
};

/// The boomerang carrot: a point behind `target` along its heading, `lead`
/// of the way back toward the robot's current distance.
///
/// Its heading is the bearing from `pose` to the carrot. With `lead == 0`
/// the carrot is the target position itself.
pub fn carrot_point(pose: &Pose, target: &Pose, lead: f64) -> Pose {
    let carrot = *target - target.heading_vector() * (lead * pose.distance_to(target));
    carrot.with_theta(pose.angle_to(&carrot))
}

/// Errors toward `point` as (lateral, angular) in (inches, radians).
///
/// Lateral error is the distance projected onto the robot's heading, so it
/// is negative when the point is behind. Angular error is toward the point
/// when driving `forwards`, toward its mirror otherwise.
fn point_errors(pose: &Pose, point: &Pose, forwards: bool) -> (f64, f64) {
    let bearing = pose.angle_to(point);
    let facing = angle_error(bearing, pose.theta);
    let lateral = pose.distance_to(point) * facing.cos();
    let angular = if forwards { facing } else { angle_error(bearing + PI, pose.theta) };
    (lateral, angular)
}

/// Whether driving forward needs less rotation than backing up.
fn prefers_forwards(pose: &Pose, point: &Pose) -> bool {
    let bearing = pose.angle_to(point);
    angle_error(bearing, pose.theta).abs() <= angle_error(bearing + PI, pose.theta).abs()
}

impl<R: Runtime> Chassis<R> {
    /// Drives to `(x, y)` without caring about the final heading.
    ///
    /// Steering stops inside the close radius and the robot finishes on a
    /// straight line.
    pub async fn move_to_point(&self, x: f64, y: f64, timeout: u64, params: MoveToPointParams) {
        let Some(motion) = self.begin("move_to_point", timeout) else { return };
        let target = Pose::new(x, y, 0.0);
        let mut lateral_pid = self.config.lateral.controller(timeout).with_telemetry("lateral", self.telemetry.clone());
        let mut angular_pid = self.config.angular.controller(timeout).with_telemetry("angular", self.telemetry.clone());

        let mut max_speed = params.max_speed;
        let mut prev_lateral: f64 = 0.0;
        let mut close = false;

        while motion.active() && !lateral_pid.settled() {
            let pose = self.pose();
            let now = motion.now();
            if !close && pose.distance_to(&target) < self.config.close_radius {
                close = true;
                max_speed = f64::max(prev_lateral.abs(), self.config.close_min_speed).min(params.max_speed);
            }

            let forwards = params.forwards.unwrap_or_else(|| prefers_forwards(&pose, &target));
            let (lateral_error, angular_error) = point_errors(&pose, &target, forwards);

            let mut lateral = clamp_abs(lateral_pid.update_error(lateral_error, now, params.log), max_speed);
            if !close {
                lateral = slew(lateral, prev_lateral, self.config.lateral.slew);
                // a forced direction never drives the other way while turning around
                match params.forwards {
                    Some(true) => lateral = lateral.max(0.0),
                    Some(false) => lateral = lateral.min(0.0),
                    None => {}
                }
            }
            let angular = if close {
                0.0
            } else {
                clamp_abs(angular_pid.update_error(angular_error.to_degrees(), now, params.log), max_speed)
            };

            self.drive(lateral - angular, lateral + angular, max_speed);
            prev_lateral = lateral;
            self.tick().await;
        }
        debug!(
            "move_to_point finished after {}ms: {:?}",
            motion.elapsed().as_millis(),
            lateral_pid.settle_state()
        );
    }

    /// Drives to `(x, y)` arriving at `heading` degrees, following a curve
    /// shaped by `params.lead`.
    pub async fn move_to_pose(&self, x: f64, y: f64, heading: f64, timeout: u64, params: MoveToPoseParams) {
        let Some(motion) = self.begin("move_to_pose", timeout) else { return };
        let target = Pose::from_degrees(x, y, heading);
        let mut lateral_pid = self.config.lateral.controller(timeout).with_telemetry("lateral", self.telemetry.clone());
        let mut angular_pid = self.config.angular.controller(timeout).with_telemetry("angular", self.telemetry.clone());

        let mut max_speed = params.max_speed;
        let mut prev_lateral: f64 = 0.0;
        let mut close = false;

        while motion.active() && (!lateral_pid.settled() || motion.elapsed() < params.min_time) {
            let pose = self.pose();
            let now = motion.now();

            let carrot = if close { target } else { carrot_point(&pose, &target, params.lead) };

            // drive at the carrot whichever way round needs less turning
            let error1 = angle_error(carrot.theta, pose.theta);
            let error2 = angle_error(carrot.theta + PI, pose.theta);
            let angular_error = if error1.abs() < error2.abs() { error1 } else { error2 };
            let lateral_error = if close {
                // projection onto the real target, not onto the final heading
                point_errors(&pose, &target, true).0
            } else {
                pose.distance_to(&carrot) * error1.cos()
            };

            let mut lateral = clamp_abs(lateral_pid.update_error(lateral_error, now, params.log), max_speed);
            if !close {
                lateral = slew(lateral, prev_lateral, self.config.lateral.slew);
            }
            // slow down while facing across the path
            lateral *= angular_error.cos().abs();

            let angular = clamp_abs(angular_pid.update_error(angular_error.to_degrees(), now, params.log), max_speed);

            // give up path speed before heading when saturated
            let overturn = angular.abs() + lateral.abs() - max_speed;
            if overturn > 0.0 {
                lateral -= sgn(lateral) * overturn;
            }

            if !close && pose.distance_to(&target) < self.config.close_radius {
                close = true;
                max_speed = f64::max(prev_lateral.abs(), self.config.close_min_speed).min(params.max_speed);
            }

            self.drive(lateral - angular, lateral + angular, max_speed);
            prev_lateral = lateral;
            self.tick().await;
        }
        debug!(
            "move_to_pose finished after {}ms: {:?}",
            motion.elapsed().as_millis(),
            lateral_pid.settle_state()
        );
    }
}
