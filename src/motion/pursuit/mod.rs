//! Pure pursuit path following.
//!
//! # Algorithm Overview
//!
//! 1. Draw a circle centered on the robot with radius = lookahead distance.
//! 2. Starting from the waypoint found last tick, walk forward along the
//!    path and keep the furthest waypoint still inside the circle. The
//!    search never walks backward, so the robot cannot be pulled back
//!    along the path.
//! 3. Refine the target to where the circle crosses the segment after that
//!    waypoint.
//! 4. Drive the circular arc tangent to the robot's heading that passes
//!    through the target, slowing down as the end of the path approaches.
//!
//! The motion itself is [`crate::motion::chassis::Chassis::follow`].
//!
//! # Example
//!
//! ```ignore
//! use kinesis::motion::{chassis::PursuitParams, pursuit::geo::{Path, Point}};
//!
//! let path = Path::from_vec(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(24.0, 0.0),
//!     Point::new(24.0, 24.0),
//! ]);
//!
//! chassis.follow(&path, 12.0, 4000, PursuitParams::default()).await;
//! ```

/// Lookahead search and arc geometry.
pub mod algorithm;

/// Geometry primitives for path definition.
///
/// Provides `Point`, `Line`, `Path`, and `Circle` types
/// used by the pursuit algorithm.
pub mod geo;

pub use geo::{Path, Point};
