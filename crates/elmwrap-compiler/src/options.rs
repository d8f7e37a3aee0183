//! Compiler options and the exhaustive option-key check.
//!
//! [`CompileOptions`] is a closed struct, so options built in Rust can never
//! carry an unknown key. Options that arrive as dynamic data (JSON values,
//! TOML documents, option files) go through [`validate_keys`] first, which
//! rejects anything outside [`RECOGNIZED_OPTIONS`] and names the offending
//! key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::args::{RTS_END, RTS_START};
use crate::error::{CompilerError, CompilerResult, ValidationError};

/// Every option key the wrapper understands, in configuration-file spelling.
pub const RECOGNIZED_OPTIONS: &[&str] = &[
    "cwd",
    "pathToElm",
    "verbose",
    "output",
    "runtimeOptions",
    "debug",
    "optimize",
    "report",
    "docs",
];

/// Keys older wrapper releases accepted, with what to do instead.
const RETIRED_OPTIONS: &[(&str, &str)] = &[
    (
        "yes",
        "`yes` was removed in Elm 0.19; re-run without passing it",
    ),
    (
        "warn",
        "`warn` was removed in Elm 0.19; re-run without passing it",
    ),
    ("pathToMake", "`pathToMake` was renamed to `pathToElm`"),
];

/// Check every key against [`RECOGNIZED_OPTIONS`].
///
/// The first unknown key fails the whole set.
///
/// # Errors
///
/// Returns [`ValidationError::UnrecognizedOption`] naming the key, with a
/// hint when the key belonged to an older release.
pub fn validate_keys<'a, I>(keys: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    for key in keys {
        if RECOGNIZED_OPTIONS.contains(&key) {
            continue;
        }
        let hint = RETIRED_OPTIONS
            .iter()
            .find(|(retired, _)| *retired == key)
            .map(|(_, hint)| *hint);
        return Err(ValidationError::UnrecognizedOption {
            key: key.to_string(),
            hint,
        });
    }
    Ok(())
}

/// Machine-readable report format for compiler diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `--report json`.
    Json,
}

impl ReportFormat {
    /// The value passed on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
        }
    }
}

/// Options for one compiler invocation.
///
/// Field names serialize in camelCase (`pathToElm`, `runtimeOptions`) so
/// option files use the same keys as the rest of the Elm tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompileOptions {
    /// Working directory for the compiler process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Explicit compiler executable. Bare names are looked up on `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_to_elm: Option<PathBuf>,
    /// Log the command line and compiler output at `info`.
    #[serde(default)]
    pub verbose: bool,
    /// Destination for the compiled artifact (`--output`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Raw flags for the compiler's runtime, emitted between `+RTS` and `-RTS`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtime_options: Vec<String>,
    /// `--debug`.
    #[serde(default)]
    pub debug: bool,
    /// `--optimize`.
    #[serde(default)]
    pub optimize: bool,
    /// `--report <format>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportFormat>,
    /// `--docs <path>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<PathBuf>,
}

impl CompileOptions {
    /// Options with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the compiler executable.
    #[must_use]
    pub fn with_path_to_elm(mut self, path: impl Into<PathBuf>) -> Self {
        self.path_to_elm = Some(path.into());
        self
    }

    /// Toggle verbose logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the output path.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Replace the runtime options.
    #[must_use]
    pub fn with_runtime_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime_options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Toggle `--debug`.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Toggle `--optimize`.
    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Set the report format.
    #[must_use]
    pub fn with_report(mut self, report: ReportFormat) -> Self {
        self.report = Some(report);
        self
    }

    /// Set the docs output path.
    #[must_use]
    pub fn with_docs(mut self, docs: impl Into<PathBuf>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// Check value-level rules. Touches neither the filesystem nor the
    /// process table.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] for an empty runtime flag
    /// or one that would break the `+RTS ... -RTS` grouping.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for flag in &self.runtime_options {
            if flag.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    key: "runtimeOptions",
                    message: "runtime flags must not be empty".into(),
                });
            }
            if flag == RTS_START || flag == RTS_END {
                return Err(ValidationError::InvalidValue {
                    key: "runtimeOptions",
                    message: format!("`{flag}` is added by the wrapper and must not be passed"),
                });
            }
        }
        Ok(())
    }

    /// Build options from a JSON object.
    ///
    /// # Errors
    ///
    /// Fails on a non-object value, an unrecognized key, a value of the wrong
    /// type, or a value rejected by [`CompileOptions::validate`].
    pub fn from_json(value: &serde_json::Value) -> CompilerResult<Self> {
        let Some(map) = value.as_object() else {
            return Err(CompilerError::Config(
                "compiler options must be a JSON object".into(),
            ));
        };
        validate_keys(map.keys().map(String::as_str))?;
        let options: Self = serde_json::from_value(value.clone())
            .map_err(|e| CompilerError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Build options from a TOML document.
    ///
    /// # Errors
    ///
    /// Same as [`CompileOptions::from_json`].
    pub fn from_toml_str(source: &str) -> CompilerResult<Self> {
        let table: toml::Table = source
            .parse()
            .map_err(|e: toml::de::Error| CompilerError::Config(e.to_string()))?;
        validate_keys(table.keys().map(String::as_str))?;
        let options: Self =
            toml::from_str(source).map_err(|e| CompilerError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a `.json` or `.toml` file.
    ///
    /// Relative `cwd` values stay relative; they are interpreted against the
    /// caller's working directory at spawn time.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Io`] if the file cannot be read, otherwise
    /// the errors of the matching parser.
    pub fn load_file(path: &Path) -> CompilerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading compiler options");
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let value: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
                CompilerError::Config(format!("{}: {e}", path.display()))
            })?;
            Self::from_json(&value)
        } else {
            Self::from_toml_str(&contents)
        }
    }
}
