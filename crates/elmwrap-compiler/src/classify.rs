//! Failure classification from compiler diagnostics.
//!
//! The message of a [`CompilationError`] is always `Compilation failed`
//! followed by the compiler's own text, untouched, so callers can keep
//! matching on compiler headings such as `PARSE ERROR` or `TYPE MISMATCH`.

use std::fmt;
use std::process::ExitStatus;

/// Marker every compilation failure message starts with.
pub const FAILURE_MARKER: &str = "Compilation failed";

const PARSE_ERROR_MARKER: &str = "PARSE ERROR";
const TYPE_MISMATCH_MARKER: &str = "TYPE MISMATCH";

/// Coarse category of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The source could not be parsed.
    Parse,
    /// The source parsed but failed type checking.
    TypeMismatch,
    /// Anything else (missing files, naming errors, crashes, ...).
    Other,
}

impl DiagnosticKind {
    /// Categorize diagnostic text. Only the text is consulted.
    #[must_use]
    pub fn from_diagnostic(text: &str) -> Self {
        if text.contains(PARSE_ERROR_MARKER) {
            Self::Parse
        } else if text.contains(TYPE_MISMATCH_MARKER) {
            Self::TypeMismatch
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse error"),
            Self::TypeMismatch => write!(f, "type mismatch"),
            Self::Other => write!(f, "compilation error"),
        }
    }
}

/// The compiler exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationError {
    kind: DiagnosticKind,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CompilationError {
    /// Category derived from the diagnostic text.
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Exit code, or `None` if the compiler was killed by a signal.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Captured stderr.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Captured stdout.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// The text the message is built from: stderr, or stdout when stderr is
    /// blank.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{FAILURE_MARKER}\n{}", self.diagnostic())
    }
}

impl std::error::Error for CompilationError {}

/// Build a [`CompilationError`] from a finished compiler process.
#[must_use]
pub fn classify_failure(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> CompilationError {
    let stdout = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr).into_owned();
    let mut error = CompilationError {
        kind: DiagnosticKind::Other,
        exit_code: status.code(),
        stdout,
        stderr,
    };
    error.kind = DiagnosticKind::from_diagnostic(error.diagnostic());
    error
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    fn exit(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code.wrapping_shl(8))
    }

    const PARSE_OUTPUT: &str = "-- PARSE ERROR ------------------------------------------------ Bad.elm\n\n\
        Something went wrong while parsing an `if` expression.\n";

    #[test]
    fn parse_error_keeps_diagnostic_verbatim() {
        let err = classify_failure(exit(1), b"", PARSE_OUTPUT.as_bytes());
        assert_eq!(err.kind(), DiagnosticKind::Parse);
        assert_eq!(err.exit_code(), Some(1));
        let message = err.to_string();
        assert!(message.starts_with("Compilation failed\n"));
        assert!(message.ends_with(PARSE_OUTPUT));
    }

    #[test]
    fn type_mismatch_is_detected() {
        let stderr = b"-- TYPE MISMATCH --------------------------------------- TypeError.elm\n";
        let err = classify_failure(exit(1), b"", stderr);
        assert_eq!(err.kind(), DiagnosticKind::TypeMismatch);
        assert!(err.to_string().contains("TYPE MISMATCH"));
    }

    #[test]
    fn unknown_diagnostics_are_other() {
        let err = classify_failure(exit(1), b"", b"-- MODULE NOT FOUND --\n");
        assert_eq!(err.kind(), DiagnosticKind::Other);
    }

    #[test]
    fn exit_code_does_not_decide_kind() {
        let a = classify_failure(exit(1), b"", PARSE_OUTPUT.as_bytes());
        let b = classify_failure(exit(2), b"", PARSE_OUTPUT.as_bytes());
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn blank_stderr_falls_back_to_stdout() {
        let err = classify_failure(exit(1), b"-- PARSE ERROR --\n", b"\n");
        assert_eq!(err.kind(), DiagnosticKind::Parse);
        assert_eq!(err.diagnostic(), "-- PARSE ERROR --\n");
    }

    #[test]
    fn signal_has_no_exit_code() {
        let err = classify_failure(ExitStatus::from_raw(9), b"", b"killed");
        assert_eq!(err.exit_code(), None);
    }
}
