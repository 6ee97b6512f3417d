//! Turns in place and swing turns.

use std::f64::consts::PI;

use log::debug;

use super::{Chassis, SwingParams, TurnParams};
use crate::{
    drivetrain::DriveSide,
    motion::pose::Pose,
    runtime::Runtime,
    util::{angle_error, clamp_abs},
};

/// Where the robot should be facing, re-evaluated every tick.
#[derive(Debug, Clone, Copy)]
enum Facing {
    /// Fixed heading in radians.
    Heading(f64),
    /// Bearing toward a point.
    Point(f64, f64),
}

impl Facing {
    fn heading(&self, pose: &Pose) -> f64 {
        match *self {
            Facing::Heading(h) => h,
            Facing::Point(x, y) => pose.angle_to(&Pose::new(x, y, 0.0)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pivot {
    InPlace,
    Swing(Option<DriveSide>),
}

/// Output split for a turn. A positive `output` turns counter-clockwise.
fn turn_powers(output: f64, pivot: Pivot) -> (f64, f64) {
    match pivot {
        Pivot::InPlace => (-output, output),
        Pivot::Swing(Some(DriveSide::Left)) => (-output, 0.0),
        Pivot::Swing(Some(DriveSide::Right)) | Pivot::Swing(None) => (0.0, output),
    }
}

/// Side that swings the robot toward a target `error` radians away.
fn swing_side(error: f64) -> DriveSide { if error > 0.0 { DriveSide::Right } else { DriveSide::Left } }

impl<R: Runtime> Chassis<R> {
    /// Turns in place to face `heading` degrees.
    ///
    /// Always takes the shorter way round.
    pub async fn turn_to_heading(&self, heading: f64, timeout: u64, params: TurnParams) {
        self.turn(
            "turn_to_heading",
            Facing::Heading(heading.to_radians()),
            Pivot::InPlace,
            timeout,
            params.max_speed,
            params.reversed,
            params.log,
        )
        .await;
    }

    /// Turns in place to face the point `(x, y)`.
    pub async fn turn_to_point(&self, x: f64, y: f64, timeout: u64, params: TurnParams) {
        self.turn(
            "turn_to_point",
            Facing::Point(x, y),
            Pivot::InPlace,
            timeout,
            params.max_speed,
            params.reversed,
            params.log,
        )
        .await;
    }

    /// Pivots about one side to face `heading` degrees.
    pub async fn swing_to_heading(&self, heading: f64, timeout: u64, params: SwingParams) {
        self.turn(
            "swing_to_heading",
            Facing::Heading(heading.to_radians()),
            Pivot::Swing(params.side),
            timeout,
            params.max_speed,
            params.reversed,
            params.log,
        )
        .await;
    }

    /// Pivots about one side to face the point `(x, y)`.
    pub async fn swing_to_point(&self, x: f64, y: f64, timeout: u64, params: SwingParams) {
        self.turn(
            "swing_to_point",
            Facing::Point(x, y),
            Pivot::Swing(params.side),
            timeout,
            params.max_speed,
            params.reversed,
            params.log,
        )
        .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn turn(
        &self,
        name: &str,
        facing: Facing,
        mut pivot: Pivot,
        timeout: u64,
        max_speed: f64,
        reversed: bool,
        log: bool,
    ) {
        let Some(motion) = self.begin(name, timeout) else { return };
        let mut pid = self.config.angular.controller(timeout).with_telemetry("angular", self.telemetry.clone());

        while motion.active() && !pid.settled() {
            let mut pose = self.pose();
            if reversed {
                pose.theta += PI;
            }
            let error = angle_error(facing.heading(&pose), pose.theta);
            if let Pivot::Swing(None) = pivot {
                // picked once so the robot cannot flip sides mid-turn
                pivot = Pivot::Swing(Some(swing_side(error)));
            }

            let output = clamp_abs(pid.update_error(error.to_degrees(), motion.now(), log), max_speed);
            let (left, right) = turn_powers(output, pivot);
            self.drive(left, right, max_speed);
            self.tick().await;
        }
        debug!("{name} finished after {}ms: {:?}", motion.elapsed().as_millis(), pid.settle_state());
    }
}
