//! Compiler wrapper error types.

use std::path::PathBuf;

use crate::classify::CompilationError;

/// A call was rejected before any process was spawned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An option name outside the recognized set.
    #[error("unrecognized Elm compiler option: {key}{}", hint_suffix(.hint))]
    UnrecognizedOption {
        /// The offending key.
        key: String,
        /// Extra guidance for options that were removed or renamed.
        hint: Option<&'static str>,
    },

    /// A recognized option carried a value the wrapper cannot use.
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue {
        /// Option name.
        key: &'static str,
        /// What is wrong with the value.
        message: String,
    },

    /// `pathToElm` (or the default lookup) points at nothing.
    #[error("Elm compiler not found at {}", .path.display())]
    ExecutableMissing {
        /// Resolved path.
        path: PathBuf,
    },

    /// `pathToElm` points at a directory.
    #[error("Elm compiler path {} is a directory", .path.display())]
    ExecutableIsDirectory {
        /// Resolved path.
        path: PathBuf,
    },

    /// The file exists but has no execute permission.
    #[error("Elm compiler at {} is not executable", .path.display())]
    ExecutableNotExecutable {
        /// Resolved path.
        path: PathBuf,
    },

    /// A bare command name could not be found on `PATH`.
    #[error("could not find `{name}` on PATH; is the Elm compiler installed?")]
    ExecutableNotFound {
        /// The command name that was looked up.
        name: String,
    },

    /// `cwd` does not name an existing directory.
    #[error("working directory {} does not exist or is not a directory", .path.display())]
    WorkingDirectory {
        /// The configured working directory.
        path: PathBuf,
    },
}

fn hint_suffix(hint: &Option<&'static str>) -> String {
    hint.map(|h| format!(" ({h})")).unwrap_or_default()
}

/// Errors from compiler invocations.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// Options or executable failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The OS failed to start the compiler.
    #[error("{message}")]
    Spawn {
        /// Program that was being started.
        program: PathBuf,
        /// Human-readable description, including install hints.
        message: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The compiler ran and reported errors.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// The compiler succeeded but its output is not valid UTF-8.
    #[error("compiled output of {} is not valid UTF-8", source_path.display())]
    OutputEncoding {
        /// Source file that was compiled.
        source_path: PathBuf,
        /// Position of the first invalid byte.
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// An option file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while handling the temp artifact or an option file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompilerError {
    /// Returns `true` if the call was rejected before a process was spawned.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The classified compilation failure, if this is one.
    #[must_use]
    pub fn as_compilation(&self) -> Option<&CompilationError> {
        match self {
            Self::Compilation(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for compiler operations.
pub type CompilerResult<T> = Result<T, CompilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_option_without_hint() {
        let err = ValidationError::UnrecognizedOption {
            key: "foo".into(),
            hint: None,
        };
        assert_eq!(err.to_string(), "unrecognized Elm compiler option: foo");
    }

    #[test]
    fn unrecognized_option_with_hint() {
        let err = ValidationError::UnrecognizedOption {
            key: "pathToMake".into(),
            hint: Some("renamed to `pathToElm`"),
        };
        assert_eq!(
            err.to_string(),
            "unrecognized Elm compiler option: pathToMake (renamed to `pathToElm`)"
        );
    }

    #[test]
    fn validation_is_transparent() {
        let err = CompilerError::from(ValidationError::ExecutableMissing {
            path: PathBuf::from("/nope/elm"),
        });
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Elm compiler not found at /nope/elm");
    }
}
