//! Geometry primitives for path definition and calculations.
//!
//! # Types
//!
//! - `Point`: A 2D point with x and y coordinates.
//! - `Line`: A line segment between two points.
//! - `Path`: A sequence of waypoints forming a path.
//! - `Circle`: A circle defined by center and radius.

use crate::motion::pose::Pose;

/// A 2D point in the field frame.
///
/// # Example
///
/// ```
/// use kinesis::motion::pursuit::geo::Point;
///
/// let waypoint = Point::new(24.0, 12.0);
/// assert_eq!(waypoint.distance_to(&Point::new(24.0, 0.0)), 12.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    /// The x-coordinate in inches.
    pub x: f64,
    /// The y-coordinate in inches.
    pub y: f64,
}

impl Point {
    /// Create a new point using `x` and `y` coordinates
    pub fn new(x: f64, y: f64) -> Self { Point { x, y } }

    pub fn distance_to(&self, other: &Point) -> f64 { (other.x - self.x).hypot(other.y - self.y) }
}

impl From<Pose> for Point {
    fn from(pose: Pose) -> Self { Point::new(pose.x, pose.y) }
}

/// An ordered sequence of waypoints.
///
/// The robot travels through these points in order during path following.
/// A path handed to a pursuit motion is not modified while it runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    /// The ordered list of waypoints.
    pub waypoints: Vec<Point>,
}

impl Path {
    /// Create a path from a vector of points
    pub fn from_vec(waypoints: Vec<Point>) -> Self { Self { waypoints } }

    /// Add a point to a path
    pub fn add(&mut self, waypoint: Point) { self.waypoints.push(waypoint); }

    /// Append a vector to the path
    pub fn append_vec(&mut self, mut waypoints: Vec<Point>) { self.waypoints.append(&mut waypoints); }

    pub fn len(&self) -> usize { self.waypoints.len() }

    pub fn is_empty(&self) -> bool { self.waypoints.is_empty() }

    pub fn last(&self) -> Option<Point> { self.waypoints.last().copied() }

    /// Segment from waypoint `i` to waypoint `i + 1`, if both exist.
    pub fn segment(&self, i: usize) -> Option<Line> {
        Some(Line::from_pts(*self.waypoints.get(i)?, *self.waypoints.get(i + 1)?))
    }

    /// Length of the path from waypoint `from` to the end.
    pub fn length_from(&self, from: usize) -> f64 {
        self.waypoints
            .get(from..)
            .map_or(0.0, |rest| rest.windows(2).map(|w| w[0].distance_to(&w[1])).sum())
    }
}

/// A line segment between two points.
///
/// Not an infinite line, only the segment between `point1` and `point2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    /// The starting point of the segment.
    pub point1: Point,
    /// The ending point of the segment.
    pub point2: Point,
}

impl Line {
    /// Create a new line from 2 points
    pub fn from_pts(point1: Point, point2: Point) -> Line { Line { point1, point2 } }
}

/// A circle defined by center coordinates and radius.
///
/// Used as the lookahead circle in the pursuit algorithm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// X-coordinate of the circle center.
    pub x: f64,
    /// Y-coordinate of the circle center.
    pub y: f64,
    /// Radius of the circle in inches.
    pub r: f64,
}

impl Circle {
    /// Create a new circle
    pub fn new(x: f64, y: f64, r: f64) -> Circle { Circle { x, y, r } }
}
