//! Process wrapper around the Elm compiler.
//!
//! This crate never interprets Elm itself. It builds the `elm make` command
//! line, spawns the compiler, and turns its exit status and diagnostics into
//! typed results:
//!
//! - [`CompileOptions`]: the closed set of recognized options, with an
//!   exhaustive key check for options that arrive as dynamic maps
//! - [`prepare_process_args`]: deterministic argument construction
//! - [`compile`]: validate, spawn, and hand back the live [`CompileProcess`]
//! - [`compile_to_string`]: compile into a scoped temp file and return its
//!   contents, classifying failures as [`CompilationError`]
//!
//! # Example
//!
//! ```rust,no_run
//! use elmwrap_compiler::{CompileOptions, compile_to_string};
//!
//! # async fn run() -> elmwrap_compiler::CompilerResult<()> {
//! let options = CompileOptions::new().with_cwd("frontend").with_optimize(true);
//! let js = compile_to_string("src/Main.elm", &options).await?;
//! println!("{} bytes of JavaScript", js.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Every entry point validates its options and the compiler executable
//! before a process is spawned. A misconfigured call fails without side
//! effects.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod args;
pub mod capture;
pub mod classify;
pub mod error;
pub mod invoker;
pub mod options;
pub mod request;

use std::path::Path;

pub use args::prepare_process_args;
pub use capture::{OutputCapture, TempArtifact};
pub use classify::{CompilationError, DiagnosticKind, classify_failure};
pub use error::{CompilerError, CompilerResult, ValidationError};
pub use invoker::{CompileProcess, PATH_TO_ELM_ENV, resolve_executable};
pub use options::{CompileOptions, RECOGNIZED_OPTIONS, ReportFormat, validate_keys};
pub use request::CompileRequest;

/// Validate `options`, spawn `elm make` and return the running process.
///
/// Option and executable checks run synchronously; when they fail no process
/// is spawned. The returned handle pipes stdout and stderr, so callers should
/// drain them or use [`CompileProcess::wait_with_output`].
///
/// # Errors
///
/// Returns [`CompilerError::Validation`] for invalid options or an unusable
/// executable, and [`CompilerError::Spawn`] if the OS refuses to start it.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime.
pub fn compile(
    source_path: impl AsRef<Path>,
    options: &CompileOptions,
) -> CompilerResult<CompileProcess> {
    CompileRequest::new(source_path, options.clone())?.spawn()
}

/// Blocking variant of [`compile`] that waits for the compiler to exit.
///
/// Returns the raw process output. A non-zero exit status is not an error
/// here; use [`classify_failure`] to interpret it.
///
/// # Errors
///
/// Returns the same pre-spawn errors as [`compile`].
pub fn compile_sync(
    source_path: impl AsRef<Path>,
    options: &CompileOptions,
) -> CompilerResult<std::process::Output> {
    CompileRequest::new(source_path, options.clone())?.run_blocking()
}

/// Compile `source_path` and return the generated output as a string.
///
/// Uses a fresh [`OutputCapture`] with the system temp directory.
///
/// # Errors
///
/// Returns [`CompilerError::Compilation`] when the compiler exits non-zero
/// and [`CompilerError::OutputEncoding`] when the output is not UTF-8, in
/// addition to the errors of [`compile`].
pub async fn compile_to_string(
    source_path: impl AsRef<Path>,
    options: &CompileOptions,
) -> CompilerResult<String> {
    OutputCapture::new()
        .compile_to_string(source_path, options)
        .await
}
