//! Logging configuration and setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::Directive,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Environment variable read by [`LogConfig::from_env`], in `EnvFilter`
/// syntax (e.g. `info,elmwrap_compiler=debug`).
pub const LOG_ENV: &str = "ELMWRAP_LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output (default).
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
    /// The `tracing-subscriber` default format.
    Full,
}

/// Log output target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to stdout.
    Stdout,
    /// Log to stderr.
    #[default]
    Stderr,
    /// Append to a single, never-rotated log file at this path.
    File(PathBuf),
    /// Route through libtest's captured output.
    Test,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base filter (e.g. "info", "debug", "warn,elmwrap_worker=trace").
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
    /// Log target.
    #[serde(default)]
    pub target: LogTarget,
    /// Include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Include file/line info.
    #[serde(default)]
    pub file_info: bool,
    /// Use ANSI colors. Ignored for file targets.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Extra filter directives (e.g. `elmwrap_compiler=debug`).
    #[serde(default)]
    pub directives: Vec<String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            timestamps: true,
            file_info: false,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Create a new log config with the specified level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Config whose level comes from [`LOG_ENV`], falling back to `info`.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(LOG_ENV) {
            Ok(level) if !level.trim().is_empty() => Self::new(level),
            _ => Self::default(),
        }
    }

    /// Set the log format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Log to a file, with colors disabled.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = LogTarget::File(path.into());
        self.ansi = false;
        self
    }

    /// Add a directive override.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Disable timestamps.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Enable file/line info.
    #[must_use]
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Disable ANSI colors.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// Build the env filter from config.
    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter =
            EnvFilter::try_new(&self.level).map_err(|source| TelemetryError::Filter {
                directive: self.level.clone(),
                source,
            })?;

        for directive in &self.directives {
            let parsed: Directive = directive
                .parse()
                .map_err(|source| TelemetryError::Filter {
                    directive: directive.clone(),
                    source,
                })?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }

    fn layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let base = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(self.file_info)
            .with_line_number(self.file_info);

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Full, true) => base.boxed(),
            (LogFormat::Full, false) => base.without_time().boxed(),
        }
    }
}

/// Split a log file path into the directory and file name the appender wants.
fn split_log_path(path: &Path) -> TelemetryResult<(PathBuf, PathBuf)> {
    let file_name = path.file_name().ok_or_else(|| TelemetryError::LogPath {
        path: path.to_path_buf(),
    })?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((directory, PathBuf::from(file_name)))
}

/// Install a global subscriber built from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for a bad level or directive,
/// [`TelemetryError::LogPath`] or [`TelemetryError::LogDirectory`] for an
/// unusable file target, and [`TelemetryError::Install`] if a global
/// subscriber is already set.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => config.layer(std::io::stdout, config.ansi),
        LogTarget::Stderr => config.layer(std::io::stderr, config.ansi),
        LogTarget::Test => config.layer(fmt::TestWriter::new(), false),
        LogTarget::File(path) => {
            let (directory, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(&directory).map_err(|source| {
                TelemetryError::LogDirectory {
                    path: directory.clone(),
                    source,
                }
            })?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            config.layer(appender, false)
        },
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(TelemetryError::from)
}

/// Install a subscriber configured from [`LOG_ENV`].
///
/// # Errors
///
/// See [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::from_env())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.timestamps);
    }

    #[test]
    fn builder_chain() {
        let config = LogConfig::new("debug")
            .with_format(LogFormat::Json)
            .with_directive("elmwrap_compiler=trace")
            .without_timestamps();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, vec!["elmwrap_compiler=trace"]);
        assert!(!config.timestamps);
    }

    #[test]
    fn file_target_disables_ansi() {
        let config = LogConfig::new("info").with_file("logs/elmwrap.log");
        assert_eq!(
            config.target,
            LogTarget::File(PathBuf::from("logs/elmwrap.log"))
        );
        assert!(!config.ansi);
    }

    #[test]
    fn filter_accepts_directives() {
        let config = LogConfig::new("warn").with_directive("elmwrap_worker=debug");
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn filter_rejects_bad_directive() {
        let config = LogConfig::new("info").with_directive("elmwrap_worker=loud");
        assert!(matches!(
            config.build_filter(),
            Err(TelemetryError::Filter { directive, .. }) if directive == "elmwrap_worker=loud"
        ));
    }

    #[test]
    fn filter_rejects_bad_level() {
        let err = LogConfig::new("elmwrap_compiler=noisy")
            .build_filter()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid log filter "elmwrap_compiler=noisy""#
        );
    }

    #[test]
    fn root_log_path_is_rejected() {
        let config = LogConfig::new("info").with_file("/");
        let err = setup_logging(&config).unwrap_err();
        assert!(matches!(&err, TelemetryError::LogPath { path } if path == Path::new("/")));
        assert_eq!(err.to_string(), "log path / has no file name");
    }

    #[test]
    fn unwritable_log_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let config = LogConfig::new("info").with_file(blocker.join("logs/elmwrap.log"));
        let err = setup_logging(&config).unwrap_err();
        match err {
            TelemetryError::LogDirectory { path, .. } => assert_eq!(path, blocker.join("logs")),
            other => panic!("expected a log directory error, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_partial_config() {
        let config: LogConfig =
            serde_json::from_str(r#"{ "level": "debug", "format": "json" }"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.ansi);
    }

    #[test]
    fn split_log_path_variants() {
        let (dir, name) = split_log_path(Path::new("/var/log/elmwrap.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(name, PathBuf::from("elmwrap.log"));

        let (dir, name) = split_log_path(Path::new("elmwrap.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("elmwrap.log"));

        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn second_setup_reports_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new("info").with_file(dir.path().join("nested/elmwrap.log"));

        setup_logging(&config).unwrap();
        assert!(dir.path().join("nested").is_dir());

        let again = setup_logging(&LogConfig::new("info").with_target(LogTarget::Test));
        assert!(matches!(again, Err(TelemetryError::Install(_))));
    }
}
