//! A shell-script stand-in for the Elm compiler.
//!
//! The fake understands `make <source> [flags] [+RTS ... -RTS]` and decides
//! the outcome from the source file name:
//!
//! | Source | Behavior |
//! |--------|----------|
//! | missing file | `FILE NOT FOUND` on stderr, exit 1 |
//! | `*Bad.elm` | `PARSE ERROR` on stderr, exit 1 |
//! | `*TypeError.elm` | `TYPE MISMATCH` on stderr, exit 1 |
//! | `*Noisy.elm` | [`NOISY_STDERR_BYTES`] bytes on stderr, exit 1 |
//! | `*Binary.elm` | writes bytes that are not UTF-8 to `--output`, exit 0 |
//! | anything else | writes worker-shaped JS to `--output`, exit 0 |
//!
//! Relative sources resolve against the process working directory, so the
//! fake also exercises `cwd` handling. Unix only.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

use crate::fixtures::{MODULE_PLACEHOLDER, WORKER_JS_TEMPLATE, write_sources};

const SCRIPT_HEAD: &str = r#"#!/bin/sh
# Stand-in for the Elm compiler used by the elmwrap test suites.
if [ "$1" != "make" ]; then
  echo "fake elm: expected the make subcommand" >&2
  exit 2
fi
shift
src=""
out=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift 2 ;;
    --report|--docs) shift 2 ;;
    --debug|--optimize) shift ;;
    +RTS)
      while [ "$#" -gt 0 ] && [ "$1" != "-RTS" ]; do shift; done
      if [ "$#" -gt 0 ]; then shift; fi
      ;;
    -*) echo "fake elm: unknown flag $1" >&2; exit 2 ;;
    *) src="$1"; shift ;;
  esac
done
if [ ! -f "$src" ]; then
  printf '%s %s\n\n%s\n' "-- FILE NOT FOUND ---------------------------------------" "$src" "I cannot find that file." >&2
  exit 1
fi
case "$src" in
  *Bad.elm)
    printf '%s %s\n\n%s\n' "-- PARSE ERROR ------------------------------------------" "$src" "Something went wrong while parsing an if expression." >&2
    exit 1
    ;;
  *TypeError.elm)
    printf '%s %s\n\n%s\n' "-- TYPE MISMATCH ----------------------------------------" "$src" "I cannot do addition with String values like this one." >&2
    exit 1
    ;;
  *Noisy.elm)
    head -c 300000 /dev/zero | tr '\0' 'x' >&2
    exit 1
    ;;
  *Binary.elm)
    if [ -n "$out" ]; then printf '\377\376elm' > "$out"; fi
    echo "Success! Compiled 1 module."
    exit 0
    ;;
esac
mod=$(basename "$src" .elm)
if [ -n "$out" ]; then
  cat > "$out" <<EOF
"#;

const SCRIPT_TAIL: &str = r#"EOF
fi
echo "Success! Compiled 1 module."
"#;

/// Bytes the fake writes to stderr for `*Noisy.elm`; larger than any pipe
/// buffer.
pub const NOISY_STDERR_BYTES: usize = 300_000;

/// An installed fake compiler plus an Elm fixture project.
#[derive(Debug)]
pub struct FakeCompiler {
    root: TempDir,
    executable: PathBuf,
    fixtures: PathBuf,
}

impl FakeCompiler {
    /// Install a fresh fake compiler and fixture project in a temp dir.
    ///
    /// Prefer [`FakeCompiler::shared`] in multi-threaded test binaries:
    /// writing an executable while another thread forks can make the next
    /// exec fail with `ETXTBSY`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from writing the files.
    pub fn install() -> io::Result<Self> {
        let root = tempfile::Builder::new().prefix("elmwrap-fake-").tempdir()?;

        let bin = root.path().join("bin");
        std::fs::create_dir_all(&bin)?;
        let executable = bin.join("elm");
        std::fs::write(&executable, script())?;
        make_executable(&executable)?;

        let fixtures = root.path().join("fixtures");
        write_sources(&fixtures)?;

        Ok(Self {
            root,
            executable,
            fixtures,
        })
    }

    /// One fake compiler per test binary, installed on first use.
    ///
    /// # Panics
    ///
    /// Panics if the install fails.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<FakeCompiler> = OnceLock::new();
        SHARED.get_or_init(|| Self::install().expect("install fake Elm compiler"))
    }

    /// Path to the fake `elm` executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Directory holding `elm.json` and the `.elm` fixtures.
    #[must_use]
    pub fn fixtures_dir(&self) -> &Path {
        &self.fixtures
    }

    /// Absolute path of a fixture file.
    #[must_use]
    pub fn fixture(&self, name: &str) -> PathBuf {
        self.fixtures.join(name)
    }

    /// Root of the install; `bin/` and `fixtures/` live here.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

fn script() -> String {
    let body = WORKER_JS_TEMPLATE.replace(MODULE_PLACEHOLDER, "${mod}");
    let mut script = String::with_capacity(
        SCRIPT_HEAD
            .len()
            .saturating_add(body.len())
            .saturating_add(SCRIPT_TAIL.len()),
    );
    script.push_str(SCRIPT_HEAD);
    script.push_str(&body);
    script.push_str(SCRIPT_TAIL);
    script
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
