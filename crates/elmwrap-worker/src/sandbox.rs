//! The sandbox capability.
//!
//! A [`ScriptSandbox`] turns compiled JavaScript into a running
//! [`WorkerInstance`]. The instance speaks JSON values only; the
//! subscription bookkeeping lives in [`crate::WorkerHandle`], so sandboxes
//! stay small.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WorkerResult;

/// Which way messages flow through a port, seen from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Worker to host; supports `subscribe`.
    Outbound,
    /// Host to worker; supports `send`.
    Inbound,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}

/// A port declared by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name as declared in the Elm source.
    pub name: String,
    /// Message direction.
    pub direction: PortDirection,
}

/// A message a worker emitted on an outbound port.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Port the message was emitted on.
    pub port: String,
    /// The emitted value.
    pub payload: Value,
}

/// Executes compiled worker output.
///
/// Implementations are factories: they hold configuration only and build a
/// fresh, isolated instance per call.
pub trait ScriptSandbox: Send + Sync {
    /// Evaluate `script`, look up `module_name` in the namespace it defines,
    /// and start that module's worker with `flags`.
    ///
    /// Dotted module names walk nested namespaces.
    ///
    /// # Errors
    ///
    /// [`crate::WorkerError::ModuleNotFound`] when the module is absent,
    /// [`crate::WorkerError::Script`] when evaluation or start-up throws.
    fn instantiate(
        &self,
        script: &str,
        module_name: &str,
        flags: Option<&Value>,
    ) -> WorkerResult<Box<dyn WorkerInstance>>;
}

/// A running worker.
///
/// Instances are driven synchronously from one thread and need not be
/// `Send`.
pub trait WorkerInstance {
    /// Ports the worker declared at start-up.
    fn ports(&self) -> &[PortSpec];

    /// Take every message emitted since the last call, in emission order.
    ///
    /// # Errors
    ///
    /// Fails if the sandbox cannot finish pending work or a payload is not
    /// valid JSON.
    fn drain_outbound(&mut self) -> WorkerResult<Vec<OutboundMessage>>;

    /// Deliver `payload` to the inbound port `port`.
    ///
    /// # Errors
    ///
    /// Fails if the worker throws while handling the message.
    fn send(&mut self, port: &str, payload: &Value) -> WorkerResult<()>;
}
