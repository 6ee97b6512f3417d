use std::{rc::Rc, time::Duration};

use super::settle::{ExitConditions, SettleDetector, SettleState};
use crate::{drivetrain::MAX_POWER, telemetry::Telemetry};

/// Step assumed for the first update, before a previous timestamp exists.
const DEFAULT_DT: Duration = Duration::from_millis(10);

/// A PID controller with an attached [`SettleDetector`].
///
/// One instance lives for exactly one motion. Every call to
/// [`Pid::update`] also polls the detector with the magnitude of the new
/// error and the time since the first update, so [`Pid::settled`] can be
/// used directly as the loop's exit condition.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use kinesis::motion::pid::{ExitConditions, Pid};
///
/// let mut pid = Pid::new(2.0, 0.0, 0.0, ExitConditions::new(3.0, 1.0, 500, 100, 2000));
/// let out = pid.update(24.0, 20.0, Duration::from_millis(0), false);
/// assert_eq!(out, 8.0);
/// assert!(!pid.settled());
/// ```
pub struct Pid {
    kp:         f64,
    ki:         f64,
    kd:         f64,
    integral:   f64,
    prev_error: f64,
    prev_time:  Option<Duration>,
    start:      Option<Duration>,
    detector:   SettleDetector,
    telemetry:  Option<(&'static str, Rc<dyn Telemetry>)>,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64, exit: ExitConditions) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: 0.0,
            prev_time: None,
            start: None,
            detector: SettleDetector::new(exit),
            telemetry: None,
        }
    }

    /// Attaches a telemetry sink. Samples are only sent for updates called
    /// with `log` set.
    pub fn with_telemetry(mut self, channel: &'static str, sink: Rc<dyn Telemetry>) -> Self {
        self.telemetry = Some((channel, sink));
        self
    }

    /// Computes the output for `target - current`.
    pub fn update(&mut self, target: f64, current: f64, now: Duration, log: bool) -> f64 {
        self.update_error(target - current, now, log)
    }

    /// Computes the output for a precomputed error.
    ///
    /// The derivative term is zero on the first call so a large initial
    /// error does not produce a kick.
    pub fn update_error(&mut self, error: f64, now: Duration, log: bool) -> f64 {
        let start = *self.start.get_or_insert(now);
        let (dt, derivative) = match self.prev_time {
            Some(prev) => {
                let dt = now.saturating_sub(prev).max(Duration::from_millis(1)).as_secs_f64();
                (dt, (error - self.prev_error) / dt)
            }
            None => (DEFAULT_DT.as_secs_f64(), 0.0),
        };

        self.integral += error * dt;
        if self.ki != 0.0 {
            let i_max = MAX_POWER / self.ki.abs();
            self.integral = self.integral.clamp(-i_max, i_max);
        }

        let output = self.kp * error + self.ki * self.integral + self.kd * derivative;

        self.prev_error = error;
        self.prev_time = Some(now);
        self.detector.poll(error.abs(), now.saturating_sub(start));

        if log {
            if let Some((channel, sink)) = &self.telemetry {
                sink.record(channel, now, error, output);
            }
        }
        output
    }

    /// Whether the attached detector has declared the motion done.
    pub fn settled(&self) -> bool { self.detector.is_settled() }

    pub fn settle_state(&self) -> SettleState { self.detector.state() }
}
