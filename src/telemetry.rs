//! Telemetry sinks for controller and sensor data.
//!
//! The control loops push `(channel, timestamp, error, output)` samples
//! into a [`Telemetry`] implementation whenever logging is requested for a
//! motion. Sinks must not block: they run inside the control loop.

use std::time::Duration;

use log::{debug, warn};

/// Receiver for controller samples and sensor fault reports.
pub trait Telemetry {
    /// Records one controller update.
    fn record(&self, channel: &str, timestamp: Duration, error: f64, output: f64);

    /// Reports that `source` produced an unusable reading this tick.
    fn fault(&self, source: &str, timestamp: Duration) {
        let _ = (source, timestamp);
    }
}

/// Forwards samples to the [`log`] facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn record(&self, channel: &str, timestamp: Duration, error: f64, output: f64) {
        debug!(
            "{channel} t={}ms error={error:.3} output={output:.3}",
            timestamp.as_millis()
        );
    }

    fn fault(&self, source: &str, timestamp: Duration) {
        warn!("{source} fault at t={}ms", timestamp.as_millis());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn record(&self, _: &str, _: Duration, _: f64, _: f64) {}
}
