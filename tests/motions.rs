mod common;

use std::{cell::Cell, time::Duration};

use approx::assert_abs_diff_eq;
use common::{GyroMode, Sim};
use kinesis::{
    drivetrain::DriveSide,
    error::{ChassisError, SensorError},
    motion::{
        chassis::{MoveToPointParams, MoveToPoseParams, PursuitParams, SwingParams, TurnParams},
        pose::Pose,
        pursuit::{Path, Point},
    },
    runtime::{RunState, Runtime},
    util::angle_error,
};

const TICK: Duration = Duration::from_millis(10);

/// Number of times the forward component of the commands changes sign.
fn lateral_sign_changes(commands: &[(Duration, f64, f64)]) -> usize {
    let signs: Vec<bool> = commands
        .iter()
        .map(|&(_, l, r)| (l + r) / 2.0)
        .filter(|v| v.abs() > 1e-9)
        .map(|v| v > 0.0)
        .collect();
    signs.windows(2).filter(|w| w[0] != w[1]).count()
}

#[tokio::test(start_paused = true)]
async fn turn_takes_the_short_way() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        sim.chassis.turn_to_heading(170.0, 3000, TurnParams::default()).await;

        let (_, left, right) = sim.commands_since(start)[0];
        assert!(left < 0.0 && right > 0.0, "first command ({left}, {right}) is not counter-clockwise");
        // the long way round would leave the unwrapped heading near -190
        assert_abs_diff_eq!(sim.chassis.pose_degrees().theta, 170.0, epsilon = 1.5);
        assert_abs_diff_eq!(sim.truth().theta.to_degrees(), 170.0, epsilon = 1.5);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn turn_already_at_target_settles_at_once() {
    let sim = Sim::new(0.0, 0.0, 45.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        sim.chassis.turn_to_heading(45.0, 3000, TurnParams::default()).await;
        let elapsed = sim.now() - start;

        assert_eq!(sim.commands_since(start)[0], (start, 0.0, 0.0));
        assert!(elapsed <= Duration::from_millis(100) + 2 * TICK, "took {elapsed:?}");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn move_to_point_ends_inside_small_error() {
    // facing the target
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let params = MoveToPointParams {
            max_speed: 100.0,
            ..Default::default()
        };
        let start = sim.now();
        let samples = Cell::new(Vec::new());

        let watch = async {
            let mut errors = Vec::new();
            loop {
                sim.runtime.sleep(TICK).await;
                if !sim.chassis.is_in_motion() {
                    break;
                }
                let pose = sim.chassis.pose();
                if (24.0 - pose.y).hypot(pose.x) < sim.chassis.config().close_radius {
                    errors.push(24.0 - pose.y);
                }
            }
            samples.set(errors);
        };
        tokio::join!(sim.chassis.move_to_point(0.0, 24.0, 4000, params), watch);

        let pose = sim.chassis.pose();
        assert!((0.0 - pose.x).hypot(24.0 - pose.y) <= sim.chassis.config().lateral.small_error);
        assert!(sim.now() - start < Duration::from_millis(4000), "timed out instead of settling");

        let errors = samples.take();
        assert!(!errors.is_empty());
        for pair in errors.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "lateral error grew from {} to {}", pair[0], pair[1]);
        }
        assert!(sim.commands_since(start).iter().all(|&(_, l, r)| l.abs() <= 100.0 && r.abs() <= 100.0));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn move_to_point_from_side_on() {
    // target is 90 degrees to the left of the starting heading
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let params = MoveToPointParams {
            max_speed: 100.0,
            ..Default::default()
        };
        let start = sim.now();
        sim.chassis.move_to_point(0.0, 24.0, 4000, params).await;

        let pose = sim.chassis.pose();
        assert!(
            (0.0 - pose.x).hypot(24.0 - pose.y) <= sim.chassis.config().lateral.small_error,
            "ended at ({}, {})",
            pose.x,
            pose.y
        );
        assert!(sim.now() - start < Duration::from_millis(4000), "timed out instead of settling");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn move_to_point_backwards() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        sim.chassis.move_to_point(0.0, -20.0, 4000, MoveToPointParams::default()).await;

        let pose = sim.chassis.pose();
        assert!(pose.x.hypot(-20.0 - pose.y) <= 1.0);
        // backed straight up instead of turning around
        assert_abs_diff_eq!(pose.theta_degrees(), 90.0, epsilon = 1.0);
        assert!(sim.commands_since(start).iter().all(|&(_, l, r)| l + r <= 0.0));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn boomerang_with_no_lead_drives_straight() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let params = MoveToPoseParams {
            lead: 0.0,
            ..Default::default()
        };
        sim.chassis.move_to_pose(0.0, 24.0, 90.0, 4000, params).await;

        let pose = sim.chassis.pose_degrees();
        assert_abs_diff_eq!(pose.x, 0.0, epsilon = 0.5);
        assert_abs_diff_eq!(pose.y, 24.0, epsilon = 1.0);
        assert_abs_diff_eq!(pose.theta, 90.0, epsilon = 1.0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn boomerang_to_a_target_behind() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        sim.chassis.move_to_pose(-24.0, 0.0, 0.0, 4000, MoveToPoseParams::default()).await;

        let pose = sim.chassis.pose_degrees();
        assert_abs_diff_eq!(pose.x, -24.0, epsilon = 1.0);
        assert_abs_diff_eq!(pose.y, 0.0, epsilon = 1.0);
        assert!(lateral_sign_changes(&sim.commands_since(start)) <= 2);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn boomerang_respects_min_time() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        let params = MoveToPoseParams {
            min_time: Duration::from_millis(800),
            ..Default::default()
        };
        // already there, so only min_time keeps it running
        sim.chassis.move_to_pose(0.0, 0.0, 0.0, 4000, params).await;
        assert!(sim.now() - start >= Duration::from_millis(800));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn new_motion_cancels_the_running_one() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let issued = Cell::new(Duration::ZERO);
        let returned = Cell::new(Duration::ZERO);

        let first = async {
            sim.chassis.move_to_point(0.0, 96.0, 5000, MoveToPointParams::default()).await;
            returned.set(sim.now());
        };
        let second = async {
            sim.runtime.sleep(Duration::from_millis(200)).await;
            issued.set(sim.now());
            sim.chassis.turn_to_heading(180.0, 1000, TurnParams::default()).await;
        };
        tokio::join!(first, second);

        let (issued, returned) = (issued.get(), returned.get());
        assert!(returned >= issued && returned - issued <= TICK, "first returned {returned:?}, issued {issued:?}");
        let stopped = sim
            .commands_since(issued)
            .into_iter()
            .any(|(t, l, r)| t <= returned && l == 0.0 && r == 0.0);
        assert!(stopped, "no zero-power command between preemption and return");
        assert!(!sim.chassis.is_in_motion());
        assert_abs_diff_eq!(sim.chassis.pose_degrees().theta, 180.0, epsilon = 1.5);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn cancel_all_stops_the_motion() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let cancelled = Cell::new(Duration::ZERO);
        let cancel = async {
            sim.runtime.sleep(Duration::from_millis(150)).await;
            cancelled.set(sim.now());
            sim.chassis.cancel_all_motions();
        };
        tokio::join!(sim.chassis.move_to_point(0.0, 96.0, 5000, MoveToPointParams::default()), cancel);

        assert!(sim.now() - cancelled.get() <= TICK);
        assert_eq!(sim.world.borrow().commands.last().map(|&(_, l, r)| (l, r)), Some((0.0, 0.0)));
        assert!(sim.chassis.pose().y < 96.0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn run_state_change_cancels() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let changed = Cell::new(Duration::ZERO);
        let switch = async {
            sim.runtime.sleep(Duration::from_millis(200)).await;
            changed.set(sim.now());
            sim.runtime.set_run_state(RunState::Driver);
        };
        tokio::join!(sim.chassis.move_to_point(0.0, 96.0, 5000, MoveToPointParams::default()), switch);

        assert!(sim.now() - changed.get() <= TICK);
        assert_eq!(sim.world.borrow().commands.last().map(|&(_, l, r)| (l, r)), Some((0.0, 0.0)));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn swing_drives_only_one_side() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        sim.chassis.swing_to_heading(180.0, 3000, SwingParams::default()).await;

        // counter-clockwise, so the right side drives and the left holds
        let commands = sim.commands_since(start);
        assert!(commands.iter().all(|&(_, l, _)| l == 0.0));
        assert!(commands.iter().any(|&(_, _, r)| r > 0.0));
        assert_abs_diff_eq!(sim.chassis.pose_degrees().theta, 180.0, epsilon = 1.5);
        // pivoted about the left wheels, half a track width to the left
        let pivot = sim.chassis.config().track_width / 2.0;
        assert_abs_diff_eq!(sim.chassis.pose().x, -pivot, epsilon = 0.5);
        assert_abs_diff_eq!(sim.chassis.pose().y, pivot, epsilon = 0.5);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn swing_on_a_chosen_side() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let start = sim.now();
        let params = SwingParams {
            side: Some(DriveSide::Left),
            ..Default::default()
        };
        sim.chassis.swing_to_point(-10.0, 0.0, 3000, params).await;

        let commands = sim.commands_since(start);
        assert!(commands.iter().all(|&(_, _, r)| r == 0.0));
        // left side backs up to turn counter-clockwise
        assert!(commands.iter().any(|&(_, l, _)| l < 0.0));
        let pose = sim.chassis.pose();
        let facing = angle_error(pose.angle_to(&Pose::new(-10.0, 0.0, 0.0)), pose.theta);
        assert_abs_diff_eq!(facing.to_degrees(), 0.0, epsilon = 1.5);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn turn_to_point_reversed_faces_away() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let params = TurnParams {
            reversed: true,
            ..Default::default()
        };
        sim.chassis.turn_to_point(0.0, 20.0, 3000, params).await;
        // back toward (0, 20)
        assert_abs_diff_eq!(sim.chassis.pose_degrees().theta, -90.0, epsilon = 1.5);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn pursuit_reaches_the_end() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let mut path = Path::from_vec((0..=6).map(|i| Point::new(0.0, i as f64 * 6.0)).collect());
        path.append_vec((1..=4).map(|i| Point::new(i as f64 * 6.0, 36.0 + i as f64 * 3.0)).collect());
        let end = path.last().expect("non-empty path");

        let params = PursuitParams {
            log: true,
            ..Default::default()
        };
        sim.chassis.follow(&path, 8.0, 6000, params).await;

        let pose = sim.chassis.pose();
        assert!(Point::from(pose).distance_to(&end) < 3.0, "stopped at {pose:?}");
        assert!(sim.telemetry.samples.borrow().iter().any(|(channel, ..)| channel == "pursuit"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn pursuit_backwards() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        let path = Path::from_vec((0..=6).map(|i| Point::new(0.0, i as f64 * -6.0)).collect());
        let params = PursuitParams {
            reversed: true,
            ..Default::default()
        };
        sim.chassis.follow(&path, 8.0, 6000, params).await;

        let pose = sim.chassis.pose();
        assert!(pose.x.hypot(pose.y + 36.0) < 3.0, "stopped at {pose:?}");
        assert_abs_diff_eq!(pose.theta_degrees(), 90.0, epsilon = 3.0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn heading_falls_back_to_wheels_when_gyro_drops() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        sim.gyro.set(GyroMode::Disconnected);
        sim.chassis.turn_to_heading(0.0, 3000, TurnParams::default()).await;

        assert_abs_diff_eq!(sim.chassis.pose_degrees().theta, 0.0, epsilon = 1.5);
        assert_abs_diff_eq!(sim.truth().theta.to_degrees(), 0.0, epsilon = 1.5);
        let faults = sim.telemetry.faults.borrow();
        // reported once, on the transition
        assert_eq!(faults.iter().filter(|(source, _)| source == "gyro").count(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn motions_wait_for_calibration() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.chassis.move_to_point(24.0, 0.0, 2000, MoveToPointParams::default()).await;
        assert_eq!(sim.now(), Duration::ZERO);
        assert!(sim.world.borrow().commands.is_empty());
        assert!(!sim.chassis.is_calibrated());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn calibration_timeout_can_be_retried() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Stuck);
    sim.run(async {
        let result = sim.chassis.calibrate().await;
        assert_eq!(result, Err(ChassisError::CalibrationTimeout(300)));
        assert!(sim.now() >= Duration::from_millis(300));
        assert!(!sim.chassis.is_calibrated());

        sim.gyro.set(GyroMode::Ready);
        assert_eq!(sim.chassis.calibrate().await, Ok(()));
        assert!(sim.chassis.is_calibrated());
        assert_eq!(sim.chassis.calibrate().await, Err(ChassisError::AlreadyCalibrated));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn calibration_failure_is_reported() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Broken);
    sim.run(async {
        let result = sim.chassis.calibrate().await;
        assert_eq!(result, Err(ChassisError::Calibration(SensorError::Port("no response".to_string()))));
        sim.chassis.turn_to_heading(90.0, 1000, TurnParams::default()).await;
        assert!(sim.world.borrow().commands.is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn odometry_tracks_a_drive() {
    let sim = Sim::new(0.0, 0.0, 0.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        sim.chassis.drivetrain().set_power(63.5, 127.0);
        sim.runtime.sleep(Duration::from_millis(750)).await;
        sim.chassis.drivetrain().stop();
        sim.runtime.sleep(TICK * 2).await;

        let (estimate, truth) = (sim.chassis.pose(), sim.truth());
        assert_abs_diff_eq!(estimate.x, truth.x, epsilon = 0.25);
        assert_abs_diff_eq!(estimate.y, truth.y, epsilon = 0.25);
        assert_abs_diff_eq!(estimate.theta, truth.theta, epsilon = 0.01);
        assert_abs_diff_eq!(sim.chassis.speed().x, 0.0, epsilon = 1e-9);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn speed_and_pose_estimate() {
    let sim = Sim::new(0.0, 0.0, 90.0, GyroMode::Ready);
    sim.run(async {
        sim.start().await;
        sim.chassis.drivetrain().set_power(127.0, 127.0);
        sim.runtime.sleep(Duration::from_millis(200)).await;

        // odometry and physics tick on their own schedules, so allow a step of slop
        let tolerance = common::TOP_SPEED * 0.15;
        let local = sim.chassis.local_speed();
        assert_abs_diff_eq!(local.x, common::TOP_SPEED, epsilon = tolerance);
        assert_abs_diff_eq!(local.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sim.chassis.speed().x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sim.chassis.speed().y, common::TOP_SPEED, epsilon = tolerance);

        let state = sim.chassis.state();
        let ahead = sim.chassis.estimate_pose(0.5);
        assert_abs_diff_eq!(ahead.x, state.pose.x + state.velocity.x * 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ahead.y, state.pose.y + state.velocity.y * 0.5, epsilon = 1e-9);
        assert!(ahead.y > state.pose.y + 20.0);
        sim.chassis.drivetrain().stop();
    })
    .await;
}
