#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs)]

//! Logging setup shared by the llf binaries.
//!
//! Logs are written to stderr so that command output streamed to stdout stays
//! machine-readable.

mod error;
mod init;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
