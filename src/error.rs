//! Error types surfaced by devices and the chassis.

/// A device could not be read or commanded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("device disconnected")]
    Disconnected,

    #[error("port error: {0}")]
    Port(String),
}

/// Errors that stop the chassis from starting odometry.
///
/// Motion primitives never return errors; only setup can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChassisError {
    #[error("heading sensor failed to calibrate: {0}")]
    Calibration(#[from] SensorError),

    #[error("heading sensor still calibrating after {0} ms")]
    CalibrationTimeout(u64),

    #[error("heading sensor finished calibrating but reports itself uncalibrated")]
    NotCalibrated,

    #[error("chassis is already calibrated")]
    AlreadyCalibrated,
}
