//! Telemetry error types.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or an extra directive is not valid `EnvFilter` syntax.
    #[error("invalid log filter {directive:?}")]
    Filter {
        /// The directive as configured.
        directive: String,
        /// Parser diagnostic.
        #[source]
        source: ParseError,
    },

    /// A file target that names no file, such as `/`.
    #[error("log path {} has no file name", path.display())]
    LogPath {
        /// The configured path.
        path: PathBuf,
    },

    /// The directory of a file target could not be created.
    #[error("cannot create log directory {}", path.display())]
    LogDirectory {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("cannot install the global tracing subscriber")]
    Install(#[from] TryInitError),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
