//! Console and file logger.
//!
//! This module implements the [`log`] crate's logging facade, writing log
//! messages to both the console and a file. On the V5 Brain the file lands
//! on the SD card.
//!
//! # Usage
//!
//! Initialize the logger once at the start of your program:
//!
//! ```ignore
//! use kinesis::fs::logger;
//! use log::{info, warn, LevelFilter};
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     logger::init(LevelFilter::Debug).expect("Logger init failed");
//!
//!     info!("Program started");
//!     warn!("This is a warning");
//! }
//! ```
//!
//! # Log Output
//!
//! Each log entry includes:
//! - Log level (TRACE, DEBUG, INFO, WARN, ERROR)
//! - Timestamp (time since the logger was installed, or since program
//!   start on the brain)
//! - Target (module path)
//! - Message
//!
//! Example output:
//! ```text
//! INFO [2m 5s 123ms] kinesis::motion::chassis - move_to_pose started, timeout 3000ms
//! WARN [2m 5s 456ms] kinesis::motion::odom::tracker - gyro reading unusable, excluding it from odometry
//! ```

use std::{
    fmt,
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
    sync::{Mutex, OnceLock},
    time::Duration,
};

use humantime::format_duration;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Default log file name.
pub const LOG_FILE: &str = "log.txt";

/// A dual-output logger.
///
/// Writes log messages to both the console and a file. The file is
/// created/truncated when the logger is initialized.
pub struct KinesisLogger {
    /// Buffered file writer for log output.
    ///
    /// `None` if the file could not be opened (e.g., no SD card present).
    file_writer: Mutex<Option<BufWriter<std::fs::File>>>,
    #[cfg(not(feature = "vexide"))]
    started:     std::time::Instant,
}

impl KinesisLogger {
    fn new(path: &Path) -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
            #[cfg(not(feature = "vexide"))]
            started: std::time::Instant::now(),
        }
    }

    #[cfg(not(feature = "vexide"))]
    fn uptime(&self) -> Duration { self.started.elapsed() }

    #[cfg(feature = "vexide")]
    fn uptime(&self) -> Duration { ::vexide::time::user_uptime() }
}

impl log::Log for KinesisLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_line = format_line(record.level(), self.uptime(), record.target(), record.args());

            print!("{}", log_line);

            if let Ok(mut writer_guard) = self.file_writer.lock() {
                if let Some(ref mut writer) = *writer_guard {
                    let _ = writer.write_all(log_line.as_bytes());
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(ref mut writer) = *writer_guard {
                let _ = writer.flush();
            }
        }
    }
}

/// Builds one log line, newline included.
///
/// Uptime is truncated to milliseconds before formatting.
pub fn format_line(level: Level, uptime: Duration, target: &str, args: &fmt::Arguments) -> String {
    let uptime = Duration::from_millis(uptime.as_millis() as u64);
    format!("{} [{}] {} - {}\n", level, format_duration(uptime), target, args)
}

static LOGGER: OnceLock<KinesisLogger> = OnceLock::new();

/// Installs the logger, writing to [`LOG_FILE`].
///
/// This function must be called once before any logging macros are used.
///
/// # Arguments
///
/// * `level` - The minimum log level to record. Messages below this level
///   will be ignored.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> { init_with_file(level, LOG_FILE) }

/// Installs the logger, writing to `path`.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init_with_file(level: LevelFilter, path: impl AsRef<Path>) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| KinesisLogger::new(path.as_ref()));
    log::set_logger(logger).map(|()| log::set_max_level(level))
}
