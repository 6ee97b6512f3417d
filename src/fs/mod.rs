//! Filesystem utilities.
//!
//! # Logging
//!
//! The `logger` submodule provides a logger that writes to the console and
//! to `log.txt`. On the robot that file lives on the SD card, which is
//! useful for debugging issues that only occur on the field.
//!
//! # Example
//!
//! ```ignore
//! use kinesis::fs::logger;
//! use log::{info, LevelFilter};
//!
//! // Initialize the logger at program start
//! logger::init(LevelFilter::Debug).expect("Failed to initialize logger");
//!
//! // Now you can use standard logging macros
//! info!("Robot initialized successfully");
//! ```

/// Console and file logging.
pub mod logger;
