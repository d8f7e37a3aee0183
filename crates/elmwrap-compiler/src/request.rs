//! A validated compile request.

use std::path::{Path, PathBuf};

use crate::args::prepare_process_args;
use crate::error::{CompilerResult, ValidationError};
use crate::invoker::{self, CompileProcess};
use crate::options::CompileOptions;

/// Source path plus options, validated at construction.
///
/// A request is immutable; redirecting output produces a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    source_path: PathBuf,
    options: CompileOptions,
}

impl CompileRequest {
    /// Validate `options` and build a request.
    ///
    /// # Errors
    ///
    /// Returns the first value-level problem found by
    /// [`CompileOptions::validate`].
    pub fn new(
        source_path: impl AsRef<Path>,
        options: CompileOptions,
    ) -> Result<Self, ValidationError> {
        options.validate()?;
        Ok(Self {
            source_path: source_path.as_ref().to_path_buf(),
            options,
        })
    }

    /// The Elm source file.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The validated options.
    #[must_use]
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiler arguments for this request.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        prepare_process_args(&self.source_path, &self.options)
    }

    /// Same request, writing the artifact to `output` instead.
    #[must_use]
    pub fn with_output(mut self, output: &Path) -> Self {
        self.options.output = Some(output.to_path_buf());
        self
    }

    /// Check the executable and working directory, then spawn the compiler.
    ///
    /// # Errors
    ///
    /// Pre-spawn validation errors, or [`crate::CompilerError::Spawn`].
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn(&self) -> CompilerResult<CompileProcess> {
        let program = invoker::preflight(&self.options)?;
        invoker::spawn(&program, self.args(), &self.options)
    }

    /// Check the executable and working directory, then run the compiler to
    /// completion on the current thread.
    ///
    /// # Errors
    ///
    /// Pre-spawn validation errors, or [`crate::CompilerError::Spawn`].
    pub fn run_blocking(&self) -> CompilerResult<std::process::Output> {
        let program = invoker::preflight(&self.options)?;
        invoker::run_blocking(&program, &self.args(), &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_options() {
        let options = CompileOptions::new().with_runtime_options(["+RTS"]);
        assert!(CompileRequest::new("Main.elm", options).is_err());
    }

    #[test]
    fn with_output_overrides_output_only() {
        let request = CompileRequest::new(
            "Main.elm",
            CompileOptions::new()
                .with_output("main.html")
                .with_runtime_options(["-n8m"]),
        )
        .unwrap()
        .with_output(Path::new("/tmp/elmwrap-1.js"));

        assert_eq!(
            request.args(),
            vec![
                "make",
                "Main.elm",
                "--output",
                "/tmp/elmwrap-1.js",
                "+RTS",
                "-n8m",
                "-RTS"
            ]
        );
    }
}
