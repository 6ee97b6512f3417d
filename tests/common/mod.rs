//! A simulated robot for driving the chassis end to end.
//!
//! The drivetrain is kinematic: each side moves at a speed proportional to
//! its commanded power with no inertia or slip. Time is tokio's paused
//! clock, so every run is deterministic.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    time::Duration,
};

use kinesis::{
    drivetrain::{Differential, DriveSide, MAX_POWER, MotorGroup},
    error::SensorError,
    motion::{
        chassis::{Chassis, ChassisConfig, ControllerSettings},
        odom::{Gyro, OdomSensors},
        pose::Pose,
    },
    runtime::{RunState, Runtime},
    telemetry::Telemetry,
};
use tokio::{task::LocalSet, time::Instant};

/// Side speed at full power, in/s.
pub const TOP_SPEED: f64 = 60.0;

/// Physics step.
pub const STEP: Duration = Duration::from_millis(1);

/// One drivetrain write: (time, left, right).
pub type Command = (Duration, f64, f64);

pub struct World {
    origin:           Instant,
    last_step:        Duration,
    /// Ground-truth pose.
    pub pose:         Pose,
    pub left_power:   f64,
    pub right_power:  f64,
    /// Distance each side has rolled since its encoders were last reset.
    pub left_travel:  f64,
    pub right_travel: f64,
    pub track_width:  f64,
    pub commands:     Vec<Command>,
}

impl World {
    fn new(pose: Pose, track_width: f64) -> Self {
        Self {
            origin: Instant::now(),
            last_step: Duration::ZERO,
            pose,
            left_power: 0.0,
            right_power: 0.0,
            left_travel: 0.0,
            right_travel: 0.0,
            track_width,
            commands: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration { Instant::now().duration_since(self.origin) }

    fn step(&mut self) {
        let now = self.now();
        let dt = now.saturating_sub(self.last_step).as_secs_f64();
        self.last_step = now;

        let vl = self.left_power / MAX_POWER * TOP_SPEED;
        let vr = self.right_power / MAX_POWER * TOP_SPEED;
        let v = (vl + vr) / 2.0;
        let omega = (vr - vl) / self.track_width;
        let mid = self.pose.theta + omega * dt / 2.0;

        self.pose.x += v * dt * mid.cos();
        self.pose.y += v * dt * mid.sin();
        self.pose.theta += omega * dt;
        self.left_travel += vl * dt;
        self.right_travel += vr * dt;
    }

    /// Commands issued at or after `since`.
    pub fn commands_since(&self, since: Duration) -> Vec<Command> {
        self.commands.iter().copied().filter(|(t, ..)| *t >= since).collect()
    }
}

pub type SharedWorld = Rc<RefCell<World>>;

async fn physics(world: SharedWorld) {
    loop {
        world.borrow_mut().step();
        tokio::time::sleep(STEP).await;
    }
}

#[derive(Clone)]
pub struct SimRuntime {
    world:     SharedWorld,
    run_state: Rc<Cell<RunState>>,
}

impl SimRuntime {
    pub fn set_run_state(&self, state: RunState) { self.run_state.set(state); }
}

impl Runtime for SimRuntime {
    fn now(&self) -> Duration { self.world.borrow().now() }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> { tokio::time::sleep(duration) }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) { tokio::task::spawn_local(task); }

    fn run_state(&self) -> RunState { self.run_state.get() }
}

/// Motor group backed by the simulated world. Position is reported as motor
/// shaft radians through the configured gearing.
struct SimSide {
    world:          SharedWorld,
    side:           DriveSide,
    inches_per_rad: f64,
}

impl MotorGroup for SimSide {
    fn set_power(&mut self, power: f64) {
        let mut world = self.world.borrow_mut();
        match self.side {
            DriveSide::Left => world.left_power = power,
            DriveSide::Right => {
                // the drivetrain always writes left first
                world.right_power = power;
                let command = (world.now(), world.left_power, power);
                world.commands.push(command);
            }
        }
    }

    fn position(&self) -> Option<f64> {
        let world = self.world.borrow();
        let travel = match self.side {
            DriveSide::Left => world.left_travel,
            DriveSide::Right => world.right_travel,
        };
        Some(travel / self.inches_per_rad)
    }

    fn reset_position(&mut self) -> Result<(), SensorError> {
        let mut world = self.world.borrow_mut();
        match self.side {
            DriveSide::Left => world.left_travel = 0.0,
            DriveSide::Right => world.right_travel = 0.0,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroMode {
    /// Calibrates instantly and reads the true heading.
    Ready,
    /// Reports calibrating forever.
    Stuck,
    /// Calibration returns an error.
    Broken,
    /// Calibrated, but every reading fails.
    Disconnected,
}

struct SimGyro {
    world: SharedWorld,
    mode:  Rc<Cell<GyroMode>>,
}

impl Gyro for SimGyro {
    fn rotation(&self) -> Option<f64> {
        match self.mode.get() {
            GyroMode::Disconnected => None,
            _ => Some(self.world.borrow().pose.theta),
        }
    }

    fn is_calibrating(&self) -> bool { self.mode.get() == GyroMode::Stuck }

    fn is_calibrated(&self) -> bool { matches!(self.mode.get(), GyroMode::Ready | GyroMode::Disconnected) }

    fn calibrate(&mut self) -> Pin<Box<dyn Future<Output = Result<(), SensorError>> + '_>> {
        let result = match self.mode.get() {
            GyroMode::Broken => Err(SensorError::Port("no response".to_string())),
            _ => Ok(()),
        };
        Box::pin(std::future::ready(result))
    }
}

/// Telemetry sink that keeps everything it is sent.
#[derive(Default)]
pub struct Recorder {
    pub samples: RefCell<Vec<(String, Duration, f64, f64)>>,
    pub faults:  RefCell<Vec<(String, Duration)>>,
}

impl Telemetry for Recorder {
    fn record(&self, channel: &str, timestamp: Duration, error: f64, output: f64) {
        self.samples.borrow_mut().push((channel.to_string(), timestamp, error, output));
    }

    fn fault(&self, source: &str, timestamp: Duration) {
        self.faults.borrow_mut().push((source.to_string(), timestamp));
    }
}

/// Gains that converge without overshoot on the kinematic drivetrain.
pub fn config() -> ChassisConfig {
    ChassisConfig {
        lateral: ControllerSettings::new(8.0, 0.0, 0.0, 0.0).with_exit(3.0, 1.0, 500, 100),
        angular: ControllerSettings::new(2.0, 0.0, 0.0, 0.0).with_exit(3.0, 1.0, 500, 100),
        calibration_timeout: Duration::from_millis(300),
        ..ChassisConfig::default()
    }
}

pub struct Sim {
    start:         (f64, f64, f64),
    pub world:     SharedWorld,
    pub runtime:   SimRuntime,
    pub gyro:      Rc<Cell<GyroMode>>,
    pub telemetry: Rc<Recorder>,
    pub chassis:   Chassis<SimRuntime>,
}

impl Sim {
    /// A robot at `(x, y)` facing `heading` degrees. Must be created inside
    /// a tokio runtime.
    pub fn new(x: f64, y: f64, heading: f64, gyro: GyroMode) -> Self {
        let config = config();
        let world = Rc::new(RefCell::new(World::new(Pose::from_degrees(x, y, heading), config.track_width)));
        let runtime = SimRuntime {
            world:     world.clone(),
            run_state: Rc::new(Cell::new(RunState::Autonomous)),
        };
        let inches_per_rad = config.drive_gear_ratio * config.wheel_diameter / 2.0;
        let drivetrain = Differential::new(
            SimSide {
                world: world.clone(),
                side: DriveSide::Left,
                inches_per_rad,
            },
            SimSide {
                world: world.clone(),
                side: DriveSide::Right,
                inches_per_rad,
            },
        );
        let mode = Rc::new(Cell::new(gyro));
        let sensors = OdomSensors::default().with_gyro(SimGyro {
            world: world.clone(),
            mode:  mode.clone(),
        });
        let telemetry = Rc::new(Recorder::default());
        let chassis = Chassis::new(runtime.clone(), drivetrain, config, sensors).with_telemetry(telemetry.clone());

        Self {
            start: (x, y, heading),
            world,
            runtime,
            gyro: mode,
            telemetry,
            chassis,
        }
    }

    pub fn now(&self) -> Duration { self.runtime.now() }

    /// Ground-truth pose.
    pub fn truth(&self) -> Pose { self.world.borrow().pose }

    pub fn commands_since(&self, since: Duration) -> Vec<Command> { self.world.borrow().commands_since(since) }

    /// Calibrates and lines odometry up with the true starting pose.
    pub async fn start(&self) {
        self.chassis.calibrate().await.expect("calibration");
        let (x, y, heading) = self.start;
        self.chassis.set_pose(x, y, heading);
    }

    /// Runs `body` with physics and every spawned task ticking alongside.
    pub async fn run<F: Future>(&self, body: F) -> F::Output {
        let world = self.world.clone();
        LocalSet::new()
            .run_until(async move {
                tokio::task::spawn_local(physics(world));
                body.await
            })
            .await
    }
}
