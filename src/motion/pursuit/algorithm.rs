use super::geo::{Circle, Line, Path, Point};
use crate::motion::{odom::tracker::OdomState, pose::Pose};

const EPSILON: f64 = f64::EPSILON;

fn point_in_circle(p: &Point, cir: &Circle) -> bool { (p.x - cir.x).powi(2) + (p.y - cir.y).powi(2) <= cir.r.powi(2) }

/// Intersections of a segment with a circle, ordered along the segment.
fn line_circ_intersect(line: Line, cir: &Circle) -> Vec<(f64, Point)> {
    let p1 = line.point1;
    let p2 = line.point2;
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let fx = p1.x - cir.x;
    let fy = p1.y - cir.y;
    let a = dx * dx + dy * dy;
    if a < EPSILON {
        return Vec::new();
    }
    let b = 2.0 * (fx * dx + fy * dy);
    let c = fx * fx + fy * fy - cir.r * cir.r;
    let d = b * b - 4.0 * a * c;
    if d < 0.0 {
        return Vec::new();
    }
    let sqrt_d = d.sqrt();
    let t1 = (-b - sqrt_d) / (2.0 * a);
    let t2 = (-b + sqrt_d) / (2.0 * a);
    let mut intersections = Vec::new();

    if (0.0..=1.0).contains(&t1) {
        intersections.push((t1, Point::new(p1.x + t1 * dx, p1.y + t1 * dy)));
    }

    if (0.0..=1.0).contains(&t2) && (t2 - t1).abs() > EPSILON {
        intersections.push((t2, Point::new(p1.x + t2 * dx, p1.y + t2 * dy)));
    }

    intersections
}

/// Index of the furthest waypoint within the lookahead circle, searching
/// forward from `start` only.
///
/// The search stops at the first waypoint that leaves the circle after one
/// was found inside it, so a path that loops back near the robot is not
/// skipped ahead. If nothing is inside, `start` is kept.
pub fn lookahead_index(path: &Path, cir: &Circle, start: usize) -> usize {
    let mut found = None;
    for (i, p) in path.waypoints.iter().enumerate().skip(start) {
        if point_in_circle(p, cir) {
            found = Some(i);
        } else if found.is_some() {
            break;
        }
    }
    found.unwrap_or(start).min(path.len().saturating_sub(1))
}

/// Point the robot steers toward, given the waypoint found by
/// [`lookahead_index`].
///
/// Prefers where the circle leaves the segment after that waypoint, so the
/// target slides smoothly along the path instead of hopping between
/// waypoints.
pub fn lookahead_point(path: &Path, cir: &Circle, index: usize) -> Option<Point> {
    let waypoint = *path.waypoints.get(index)?;
    let exit = path
        .segment(index)
        .and_then(|seg| line_circ_intersect(seg, cir).last().map(|&(_, p)| p));
    Some(exit.unwrap_or(waypoint))
}

/// Target in the robot frame as (forward, left).
pub fn to_local(pose: Pose, target: Point) -> (f64, f64) {
    let (dx, dy) = (target.x - pose.x, target.y - pose.y);
    let (sin, cos) = pose.theta.sin_cos();
    (dx * cos + dy * sin, -dx * sin + dy * cos)
}

/// Signed curvature of the arc tangent to the robot's heading that passes
/// through `target`. Positive curves to the left.
pub fn curvature(pose: Pose, target: Point) -> f64 {
    let (forward, left) = to_local(pose, target);
    let d2 = forward * forward + left * left;
    if d2 < EPSILON { 0.0 } else { 2.0 * left / d2 }
}

/// Left/right wheel speeds for driving an arc of `curvature` at `speed`.
pub fn arc_speeds(speed: f64, curvature: f64, track_width: f64) -> (f64, f64) {
    let left = speed * (2.0 - curvature * track_width) / 2.0;
    let right = speed * (2.0 + curvature * track_width) / 2.0;
    (left, right)
}

/// Distance left to drive: to the current waypoint, then along the path.
pub fn remaining_distance(path: &Path, state: &OdomState, index: usize) -> f64 {
    path.waypoints.get(index).map_or(0.0, |p| Point::from(state.pose).distance_to(p))
        + path.length_from(index)
}
