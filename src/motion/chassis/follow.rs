//! Pure pursuit path following.

use std::f64::consts::PI;

use log::{debug, warn};

use super::{Chassis, PursuitParams};
use crate::{
    motion::{
        pid::SettleDetector,
        pursuit::{
            algorithm::{arc_speeds, curvature, lookahead_index, lookahead_point, remaining_distance, to_local},
            geo::{Circle, Path, Point},
        },
    },
    runtime::Runtime,
};

impl<R: Runtime> Chassis<R> {
    /// Follows `path` with a lookahead circle of radius `lookahead` inches.
    ///
    /// Ends once the lookahead has reached the last waypoint and the robot
    /// has either settled on it (using the lateral settle bands) or driven
    /// past it.
    pub async fn follow(&self, path: &Path, lookahead: f64, timeout: u64, params: PursuitParams) {
        let Some(end) = path.last().filter(|_| lookahead > 0.0) else {
            warn!("follow needs a non-empty path and a positive lookahead");
            return;
        };
        let Some(motion) = self.begin("follow", timeout) else { return };
        let mut detector = SettleDetector::new(self.config.lateral.exit_conditions(timeout));
        let last = path.len() - 1;
        let mut index = 0;

        while motion.active() {
            let state = self.state();
            let mut pose = state.pose;
            if params.reversed {
                pose.theta += PI;
            }

            let circle = Circle::new(pose.x, pose.y, lookahead);
            index = lookahead_index(path, &circle, index);
            let at_end = index == last;

            let to_end = Point::from(pose).distance_to(&end);
            detector.poll(if at_end { to_end } else { f64::INFINITY }, motion.elapsed());
            let passed_end = at_end && to_local(pose, end).0 < 0.0;
            if detector.is_settled() || passed_end {
                break;
            }

            let target = lookahead_point(path, &circle, index).unwrap_or(end);
            let remaining = remaining_distance(path, &state, index);
            let speed = (remaining * params.decel_gain).max(params.min_speed).min(params.max_speed);
            let (mut left, mut right) = arc_speeds(speed, curvature(pose, target), self.config.track_width);
            if params.reversed {
                (left, right) = (-right, -left);
            }
            if params.log {
                self.telemetry.record("pursuit", motion.now(), remaining, speed);
            }

            self.drive(left, right, params.max_speed);
            self.tick().await;
        }
        debug!(
            "follow finished after {}ms at waypoint {index}/{last}: {:?}",
            motion.elapsed().as_millis(),
            detector.state()
        );
    }
}
