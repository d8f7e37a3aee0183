//! Worker error types.

use elmwrap_compiler::CompilerError;

use crate::sandbox::PortDirection;

/// Errors from compiling, instantiating or driving a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Compiling the worker source failed. The compiler's error is kept
    /// as-is, message included.
    #[error(transparent)]
    Compiler(#[from] CompilerError),

    /// The compiled output does not define the requested module.
    #[error("module `{module}` not found in compiled output")]
    ModuleNotFound {
        /// The dotted module name that was looked up.
        module: String,
    },

    /// The sandbox rejected or failed to run the script.
    #[error("script error: {0}")]
    Script(String),

    /// The worker exposes no port with this name.
    #[error("worker has no port named `{port}`")]
    UnknownPort {
        /// Requested port name.
        port: String,
    },

    /// Subscribing to an inbound port, or sending to an outbound one.
    #[error("port `{port}` is {direction} and does not support this operation")]
    PortDirection {
        /// Port name.
        port: String,
        /// The port's actual direction.
        direction: PortDirection,
    },

    /// A port payload could not be converted to or from JSON.
    #[error("invalid port payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use elmwrap_compiler::ValidationError;

    use super::*;

    #[test]
    fn compiler_errors_keep_their_message() {
        let inner = CompilerError::from(ValidationError::ExecutableMissing {
            path: PathBuf::from("/nowhere/elm"),
        });
        let expected = inner.to_string();
        let err = WorkerError::from(inner);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn direction_error_names_port() {
        let err = WorkerError::PortDirection {
            port: "toWorker".into(),
            direction: PortDirection::Inbound,
        };
        assert_eq!(
            err.to_string(),
            "port `toWorker` is inbound and does not support this operation"
        );
    }
}
