//! Scheduling contract for the odometry task and the motion loops.
//!
//! Everything in this crate runs cooperatively. The odometry task and the
//! active motion loop each do one tick of work and then suspend in
//! [`Runtime::sleep`]; that is the only place another task may run. A
//! runtime therefore only has to supply a monotonic clock, a sleep future,
//! a way to detach a background task, and the current run state.
//!
//! With the `vexide` feature enabled, [`crate::vexide::VexideRuntime`]
//! implements this for the V5 brain.

use std::{future::Future, time::Duration};

/// Competition / run state reported by the platform.
///
/// A motion observes this when it starts and exits as soon as it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// The robot is disabled by field control.
    Disabled,
    /// Autonomous period, or no field control attached.
    #[default]
    Autonomous,
    /// Driver control period.
    Driver,
}

/// Clock, cooperative sleep and task spawning.
pub trait Runtime: Clone + 'static {
    /// Monotonic time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Suspends the caller for at least `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;

    /// Detaches `task` so it keeps running alongside the caller.
    fn spawn(&self, task: impl Future<Output = ()> + 'static);

    /// The current run state.
    fn run_state(&self) -> RunState { RunState::Autonomous }
}
