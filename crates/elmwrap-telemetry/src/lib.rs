//! Logging setup for elmwrap.
//!
//! The library crates only emit `tracing` events; they never install a
//! subscriber. Binaries and test suites call [`setup_logging`] once with a
//! [`LogConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use elmwrap_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), elmwrap_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("elmwrap_compiler=debug");
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    LOG_ENV, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
