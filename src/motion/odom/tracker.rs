//! The odometry engine.
//!
//! [`Odometry`] owns the sensors and is the only writer of the shared
//! [`OdomState`]. Everything else reads the state through an [`OdomHandle`],
//! which always hands out a complete snapshot.
//!
//! # Example
//!
//! ```ignore
//! use kinesis::motion::odom::{FaultLimits, OdomHandle, Odometry};
//!
//! let state = OdomHandle::default();
//! let odom = Odometry::new(sensors, state.clone(), FaultLimits::default(), telemetry);
//! runtime.spawn(odom.run(runtime.clone(), Duration::from_millis(10)));
//!
//! let pose = state.pose();
//! ```

use std::{
    rc::Rc,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::{info, warn};

use super::{
    algorithm::{integrate, local_displacement, pair_heading},
    devices::{OdomSensors, TrackingWheel, WheelKind},
};
use crate::{motion::pose::Pose, runtime::Runtime, telemetry::Telemetry};

/// Pose and velocity estimate published every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OdomState {
    /// Global pose. Heading is unbounded radians.
    pub pose:           Pose,
    /// Global velocity in in/s, with angular velocity in rad/s as `theta`.
    pub velocity:       Pose,
    /// Robot-frame velocity as (forward, left, angular).
    pub local_velocity: Pose,
}

/// Shared handle to the odometry state.
#[derive(Debug, Clone, Default)]
pub struct OdomHandle(Arc<Mutex<OdomState>>);

impl OdomHandle {
    pub fn new(pose: Pose) -> Self {
        Self(Arc::new(Mutex::new(OdomState {
            pose,
            ..Default::default()
        })))
    }

    fn lock(&self) -> MutexGuard<'_, OdomState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> OdomState { *self.lock() }

    pub fn pose(&self) -> Pose { self.lock().pose }

    /// Overwrites the pose. Later ticks integrate from the new value.
    pub fn set_pose(&self, pose: Pose) { self.lock().pose = pose; }

    fn update(&self, f: impl FnOnce(&mut OdomState)) { f(&mut self.lock()) }
}

/// Largest believable change of a reading in one tick. Anything larger is
/// treated as a glitch or a sensor that was reset underneath us.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultLimits {
    /// Inches.
    pub max_wheel_delta:   f64,
    /// Radians.
    pub max_heading_delta: f64,
}

impl Default for FaultLimits {
    fn default() -> Self {
        Self {
            max_wheel_delta:   6.0,
            max_heading_delta: 0.5,
        }
    }
}

/// Delta tracking and fault bookkeeping for one sensor.
#[derive(Debug)]
struct Channel {
    name:    &'static str,
    prev:    Option<f64>,
    faulted: bool,
}

impl Channel {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            prev: None,
            faulted: false,
        }
    }

    /// Delta since the previous good reading, or `None` if this tick's
    /// reading is unusable.
    fn sample(
        &mut self,
        reading: Option<f64>,
        limit: f64,
        now: Duration,
        telemetry: &dyn Telemetry,
    ) -> Option<f64> {
        let delta = match (reading, self.prev) {
            (Some(r), Some(prev)) if r.is_finite() => {
                // re-baseline either way so one glitch costs one tick
                self.prev = Some(r);
                Some(r - prev).filter(|d| d.abs() <= limit)
            }
            (Some(r), None) if r.is_finite() => {
                self.prev = Some(r);
                return None;
            }
            _ => {
                // the next good reading only re-baselines
                self.prev = None;
                None
            }
        };
        match (delta.is_some(), self.faulted) {
            (false, false) => {
                self.faulted = true;
                warn!("{} reading unusable, excluding it from odometry", self.name);
                telemetry.fault(self.name, now);
            }
            (true, true) => {
                self.faulted = false;
                info!("{} recovered", self.name);
            }
            _ => {}
        }
        delta
    }

    fn baseline(&mut self, reading: Option<f64>) {
        self.prev = reading.filter(|r| r.is_finite());
        self.faulted = false;
    }
}

/// Periodic pose estimator.
pub struct Odometry {
    sensors:     OdomSensors,
    state:       OdomHandle,
    limits:      FaultLimits,
    telemetry:   Rc<dyn Telemetry>,
    vertical:    [Channel; 2],
    horizontal:  [Channel; 2],
    gyro:        Channel,
    last_update: Option<Duration>,
}

impl Odometry {
    pub fn new(
        sensors: OdomSensors,
        state: OdomHandle,
        limits: FaultLimits,
        telemetry: Rc<dyn Telemetry>,
    ) -> Self {
        let mut odom = Self {
            sensors,
            state,
            limits,
            telemetry,
            vertical: [Channel::new("vertical1"), Channel::new("vertical2")],
            horizontal: [Channel::new("horizontal1"), Channel::new("horizontal2")],
            gyro: Channel::new("gyro"),
            last_update: None,
        };
        odom.baseline();
        odom
    }

    /// Takes the current readings as the reference for the next tick.
    pub fn baseline(&mut self) {
        let s = &self.sensors;
        self.vertical[0].baseline(s.vertical1.as_ref().and_then(TrackingWheel::distance));
        self.vertical[1].baseline(s.vertical2.as_ref().and_then(TrackingWheel::distance));
        self.horizontal[0].baseline(s.horizontal1.as_ref().and_then(TrackingWheel::distance));
        self.horizontal[1].baseline(s.horizontal2.as_ref().and_then(TrackingWheel::distance));
        self.gyro.baseline(s.gyro.as_ref().and_then(|g| g.rotation()));
    }

    /// Runs one tick at time `now`.
    pub fn update(&mut self, now: Duration) {
        let t = self.telemetry.as_ref();
        let (wheel_limit, heading_limit) = (self.limits.max_wheel_delta, self.limits.max_heading_delta);

        let sample = |ch: &mut Channel, wheel: &Option<TrackingWheel>| {
            let wheel = wheel.as_ref()?;
            Some((ch.sample(wheel.distance(), wheel_limit, now, t)?, wheel.offset, wheel.kind))
        };
        let [v1, v2] = &mut self.vertical;
        let [h1, h2] = &mut self.horizontal;
        let verticals = [sample(v1, &self.sensors.vertical1), sample(v2, &self.sensors.vertical2)];
        let horizontals = [sample(h1, &self.sensors.horizontal1), sample(h2, &self.sensors.horizontal2)];
        let gyro = match &self.sensors.gyro {
            Some(g) => self.gyro.sample(g.rotation(), heading_limit, now, t),
            None => None,
        };

        let pair = |[a, b]: [Option<(f64, f64, WheelKind)>; 2]| match (a, b) {
            (Some((d1, o1, _)), Some((d2, o2, _))) => pair_heading(d1, o1, d2, o2),
            _ => None,
        };
        let delta_theta = gyro.or_else(|| pair(horizontals)).or_else(|| pair(verticals)).unwrap_or(0.0);

        let vertical = verticals
            .iter()
            .flatten()
            .find(|(_, _, kind)| *kind == WheelKind::Dedicated)
            .or_else(|| verticals.iter().flatten().next())
            .map(|&(d, off, _)| (d, off));
        let horizontal = horizontals.iter().flatten().next().map(|&(d, off, _)| (d, off));

        let local = local_displacement(delta_theta, vertical, horizontal);
        let dt = self
            .last_update
            .map(|prev| now.saturating_sub(prev).as_secs_f64())
            .filter(|dt| *dt > 0.0);
        self.last_update = Some(now);

        self.state.update(|s| {
            let (pose, (dx, dy)) = integrate(s.pose, delta_theta, local);
            s.pose = pose;
            if let Some(dt) = dt {
                s.velocity = Pose::new(dx / dt, dy / dt, delta_theta / dt);
                s.local_velocity = Pose::new(local.0 / dt, local.1 / dt, delta_theta / dt);
            }
        });
    }

    /// Ticks forever every `period`.
    pub async fn run<R: Runtime>(mut self, runtime: R, period: Duration) {
        info!("odometry started, period {}ms", period.as_millis());
        loop {
            self.update(runtime.now());
            runtime.sleep(period).await;
        }
    }
}
