//! Prelude module - commonly used types for convenient import.
//!
//! Use `use elmwrap_compiler::prelude::*;` to import the essentials.

// Errors
pub use crate::{CompilationError, CompilerError, CompilerResult, DiagnosticKind, ValidationError};

// Options
pub use crate::{CompileOptions, ReportFormat};

// Invocation
pub use crate::{CompileProcess, CompileRequest, OutputCapture};

// Entry points
pub use crate::{compile, compile_sync, compile_to_string, prepare_process_args};
