//! Prelude module - commonly used types for convenient import.
//!
//! Use `use elmwrap_worker::prelude::*;` to import the essentials.

// Errors
pub use crate::{WorkerError, WorkerResult};

// Sandbox
pub use crate::{PortDirection, ScriptSandbox, WorkerInstance};
#[cfg(feature = "quickjs")]
pub use crate::QuickJsSandbox;

// Handles
pub use crate::{Port, WorkerEvaluator, WorkerHandle};

// Entry points
#[cfg(feature = "quickjs")]
pub use crate::compile_worker;
