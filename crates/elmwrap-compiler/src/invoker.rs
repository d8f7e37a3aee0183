//! Compiler executable resolution and process spawning.
//!
//! This is the only module that touches the process table. Before anything
//! is spawned the executable must exist, must not be a directory, and must
//! be executable; the working directory, if set, must exist. Each violation
//! is its own [`ValidationError`].

use std::ffi::OsString;
use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};

use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::{CompilerError, CompilerResult, ValidationError};
use crate::options::CompileOptions;

/// Environment variable consulted when `pathToElm` is not set.
pub const PATH_TO_ELM_ENV: &str = "ELMWRAP_PATH_TO_ELM";

/// Command looked up on `PATH` when nothing else names the compiler.
const DEFAULT_COMPILER: &str = "elm";

/// Resolve and check the compiler executable for `options`.
///
/// Precedence: `pathToElm`, then [`PATH_TO_ELM_ENV`], then `elm` on `PATH`.
/// Bare command names are looked up on `PATH`; other relative paths are
/// made absolute against the current directory.
///
/// # Errors
///
/// Returns [`ValidationError::ExecutableNotFound`],
/// [`ValidationError::ExecutableMissing`],
/// [`ValidationError::ExecutableIsDirectory`] or
/// [`ValidationError::ExecutableNotExecutable`].
pub fn resolve_executable(options: &CompileOptions) -> Result<PathBuf, ValidationError> {
    let wanted = candidate(
        options.path_to_elm.as_deref(),
        std::env::var_os(PATH_TO_ELM_ENV),
    );
    let path = locate(wanted, |name| which::which(name))?;
    debug!(path = %path.display(), "resolved Elm compiler");
    Ok(path)
}

/// Pick the compiler path before any lookup: explicit option, then the
/// environment value (ignored when empty), then [`DEFAULT_COMPILER`].
fn candidate(path_to_elm: Option<&Path>, env: Option<OsString>) -> PathBuf {
    match path_to_elm {
        Some(path) => path.to_path_buf(),
        None => env
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_COMPILER), PathBuf::from),
    }
}

/// Turn a candidate into a checked executable path. Bare command names go
/// through `lookup`.
fn locate<F>(candidate: PathBuf, lookup: F) -> Result<PathBuf, ValidationError>
where
    F: FnOnce(&Path) -> which::Result<PathBuf>,
{
    let path = if is_bare_command(&candidate) {
        lookup(&candidate).map_err(|_| ValidationError::ExecutableNotFound {
            name: candidate.to_string_lossy().into_owned(),
        })?
    } else {
        std::path::absolute(&candidate).unwrap_or(candidate)
    };

    check_executable(&path)?;
    Ok(path)
}

/// All checks that must pass before a spawn.
pub(crate) fn preflight(options: &CompileOptions) -> Result<PathBuf, ValidationError> {
    let program = resolve_executable(options)?;
    if let Some(cwd) = &options.cwd
        && !cwd.is_dir()
    {
        return Err(ValidationError::WorkingDirectory { path: cwd.clone() });
    }
    Ok(program)
}

fn is_bare_command(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn check_executable(path: &Path) -> Result<(), ValidationError> {
    let metadata = std::fs::metadata(path).map_err(|_| ValidationError::ExecutableMissing {
        path: path.to_path_buf(),
    })?;
    if metadata.is_dir() {
        return Err(ValidationError::ExecutableIsDirectory {
            path: path.to_path_buf(),
        });
    }
    if !is_executable(&metadata) {
        return Err(ValidationError::ExecutableNotExecutable {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &Metadata) -> bool {
    metadata.is_file()
}

fn log_invocation(program: &Path, args: &[String], options: &CompileOptions) {
    if options.verbose {
        info!("Running {} {}", program.display(), args.join(" "));
    } else {
        debug!(program = %program.display(), args = ?args, "spawning Elm compiler");
    }
}

fn spawn_error(program: &Path, source: io::Error) -> CompilerError {
    let message = match source.kind() {
        io::ErrorKind::NotFound => format!(
            "Could not find Elm compiler \"{}\". Is it installed?",
            program.display()
        ),
        io::ErrorKind::PermissionDenied => format!(
            "Elm compiler \"{}\" did not have permission to run. Do you need to give it executable permissions?",
            program.display()
        ),
        _ => format!(
            "Error attempting to run Elm compiler \"{}\": {source}",
            program.display()
        ),
    };
    CompilerError::Spawn {
        program: program.to_path_buf(),
        message,
        source,
    }
}

/// Spawn the compiler with piped stdout/stderr.
pub(crate) fn spawn(
    program: &Path,
    args: Vec<String>,
    options: &CompileOptions,
) -> CompilerResult<CompileProcess> {
    log_invocation(program, &args, options);

    let mut command = Command::new(program);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        command.current_dir(cwd);
    }

    let child = command.spawn().map_err(|e| spawn_error(program, e))?;
    debug!(pid = ?child.id(), "Elm compiler started");

    Ok(CompileProcess {
        child,
        program: program.to_path_buf(),
        args,
    })
}

/// Run the compiler to completion on the current thread.
pub(crate) fn run_blocking(
    program: &Path,
    args: &[String],
    options: &CompileOptions,
) -> CompilerResult<Output> {
    log_invocation(program, args, options);

    let mut command = std::process::Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(cwd) = &options.cwd {
        command.current_dir(cwd);
    }
    command.output().map_err(|e| spawn_error(program, e))
}

/// A running compiler process.
///
/// Owned by the caller; dropping it does not kill the child.
#[derive(Debug)]
pub struct CompileProcess {
    child: Child,
    program: PathBuf,
    args: Vec<String>,
}

impl CompileProcess {
    /// OS process id, or `None` once the process has been reaped.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// The executable that was spawned.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments the executable was spawned with.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Take the stdout stream. Returns `None` after the first call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the stderr stream. Returns `None` after the first call.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Wait for the compiler to exit.
    ///
    /// Any stdout/stderr that was not taken is read and discarded while
    /// waiting, so a chatty compiler cannot block on a full pipe. Use
    /// [`CompileProcess::wait_with_output`] to keep that output instead.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Io`] if waiting or draining fails.
    pub async fn wait(&mut self) -> CompilerResult<ExitStatus> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let (status, _, _) =
            tokio::try_join!(self.child.wait(), discard(stdout), discard(stderr))?;
        Ok(status)
    }

    /// Wait for exit while collecting whatever stdout/stderr was not taken.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Io`] if waiting or reading fails.
    pub async fn wait_with_output(self) -> CompilerResult<Output> {
        Ok(self.child.wait_with_output().await?)
    }

    /// Give up the wrapper and return the underlying child.
    #[must_use]
    pub fn into_child(self) -> Child {
        self.child
    }
}

async fn discard<R>(pipe: Option<R>) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(mut pipe) => tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await,
        None => Ok(0),
    }
}
