//! Headless Elm workers.
//!
//! Compiles an Elm `Platform.worker` program with `elmwrap-compiler`, runs
//! the output in an embedded JavaScript sandbox, and exposes the program's
//! ports:
//!
//! - [`ScriptSandbox`] / [`WorkerInstance`]: the sandbox capability
//! - [`QuickJsSandbox`]: the default sandbox (feature `quickjs`)
//! - [`WorkerEvaluator`]: compile, then instantiate
//! - [`WorkerHandle`]: subscribe to outbound ports, send to inbound ones
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> elmwrap_worker::WorkerResult<()> {
//! let mut worker =
//!     elmwrap_worker::compile_worker("fixtures", "BasicWorker.elm", "BasicWorker").await?;
//! worker
//!     .port("reportFromWorker")?
//!     .subscribe(|message| println!("worker said {message}"))?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod evaluator;
pub mod handle;
#[cfg(feature = "quickjs")]
pub mod quickjs;
pub mod sandbox;

pub use error::{WorkerError, WorkerResult};
pub use evaluator::WorkerEvaluator;
pub use handle::{Port, WorkerHandle};
#[cfg(feature = "quickjs")]
pub use quickjs::QuickJsSandbox;
pub use sandbox::{OutboundMessage, PortDirection, PortSpec, ScriptSandbox, WorkerInstance};

/// Compile `source` from `base_dir` and start `module_name` in QuickJS.
///
/// The compiler is located as for [`elmwrap_compiler::compile`]. Use
/// [`WorkerEvaluator`] to pass compile options, flags or another sandbox.
///
/// # Errors
///
/// Compile errors are returned unchanged inside
/// [`WorkerError::Compiler`]; a missing module is
/// [`WorkerError::ModuleNotFound`].
#[cfg(feature = "quickjs")]
pub async fn compile_worker(
    base_dir: impl AsRef<std::path::Path>,
    source: impl AsRef<std::path::Path>,
    module_name: &str,
) -> WorkerResult<WorkerHandle> {
    WorkerEvaluator::default()
        .compile(base_dir, source, module_name)
        .await
}
