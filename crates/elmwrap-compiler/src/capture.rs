//! Temp-file mediated output capture for [`compile_to_string`].
//!
//! Each call owns one [`TempArtifact`], created with a unique name and
//! removed when the call settles. Overlapping calls never share a path, so
//! there is nothing to lock.
//!
//! [`compile_to_string`]: crate::compile_to_string

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, info};

use crate::classify::classify_failure;
use crate::error::{CompilerError, CompilerResult};
use crate::options::CompileOptions;
use crate::request::CompileRequest;

/// Prefix of every temp artifact file name.
pub const TEMP_PREFIX: &str = "elmwrap-";

/// A uniquely named file that lives for exactly one compile call.
///
/// Dropping the artifact deletes the file; [`TempArtifact::release`]
/// deletes it and reports failures.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    /// Create an empty, uniquely named file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn allocate(dir: &Path, suffix: &str) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(suffix)
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Location of the artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact now.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the removal.
    pub fn release(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Suffix for the temp artifact. The compiler picks its output format from
/// the extension, so an `.html` destination keeps producing HTML.
fn artifact_suffix(output: Option<&Path>) -> &'static str {
    let is_html = output
        .and_then(Path::extension)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
    if is_html { ".html" } else { ".js" }
}

/// Compiles into a temp artifact and returns the artifact's contents.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    temp_dir: Option<PathBuf>,
}

impl OutputCapture {
    /// Capture using the system temp directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create temp artifacts in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Directory temp artifacts are created in.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Compile `source_path` and return the compiled output as text.
    ///
    /// `options.output` only selects the artifact extension; the compiler
    /// always writes to this call's temp artifact, which is deleted before
    /// this returns on every path.
    ///
    /// # Errors
    ///
    /// As for [`OutputCapture::compile_to_bytes`], plus
    /// [`crate::CompilerError::OutputEncoding`] if the output is not UTF-8.
    pub async fn compile_to_string(
        &self,
        source_path: impl AsRef<Path>,
        options: &CompileOptions,
    ) -> CompilerResult<String> {
        let source_path = source_path.as_ref();
        let compiled = self.compile_to_bytes(source_path, options).await?;
        String::from_utf8(compiled).map_err(|source| CompilerError::OutputEncoding {
            source_path: source_path.to_path_buf(),
            source,
        })
    }

    /// Compile `source_path` and return the raw bytes of the compiled output.
    ///
    /// # Errors
    ///
    /// Validation and spawn errors as for [`crate::compile`],
    /// [`crate::CompilerError::Compilation`] on a non-zero exit, and
    /// [`crate::CompilerError::Io`] if the artifact cannot be read or removed.
    pub async fn compile_to_bytes(
        &self,
        source_path: impl AsRef<Path>,
        options: &CompileOptions,
    ) -> CompilerResult<Vec<u8>> {
        let request = CompileRequest::new(source_path, options.clone())?;

        let artifact =
            TempArtifact::allocate(&self.temp_dir(), artifact_suffix(options.output.as_deref()))?;
        debug!(path = %artifact.path().display(), "allocated temp artifact");

        let process = request.with_output(artifact.path()).spawn()?;
        let output = process.wait_with_output().await?;

        if !output.status.success() {
            return Err(classify_failure(output.status, &output.stdout, &output.stderr).into());
        }
        if options.verbose {
            let console = String::from_utf8_lossy(&output.stdout);
            info!("{}", console.trim_end());
        }

        let compiled = tokio::fs::read(artifact.path()).await?;
        artifact.release()?;
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_follows_output_extension() {
        assert_eq!(artifact_suffix(None), ".js");
        assert_eq!(artifact_suffix(Some(Path::new("/dev/null"))), ".js");
        assert_eq!(artifact_suffix(Some(Path::new("main.js"))), ".js");
        assert_eq!(artifact_suffix(Some(Path::new("index.HTML"))), ".html");
    }

    #[test]
    fn artifacts_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempArtifact::allocate(dir.path(), ".js").unwrap();
        let b = TempArtifact::allocate(dir.path(), ".js").unwrap();
        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(TEMP_PREFIX));
        assert!(name.ends_with(".js"));
    }

    #[test]
    fn drop_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TempArtifact::allocate(dir.path(), ".js").unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn release_removes_only_its_own_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mine = TempArtifact::allocate(dir.path(), ".js").unwrap();
        let theirs = TempArtifact::allocate(dir.path(), ".js").unwrap();
        let mine_path = mine.path().to_path_buf();

        mine.release().unwrap();
        assert!(!mine_path.exists());
        assert!(theirs.path().exists());
    }

    #[tokio::test]
    async fn validation_failure_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let capture = OutputCapture::new().with_temp_dir(dir.path());
        let options = CompileOptions::new().with_path_to_elm("/path/to/non-existing/elm");

        let err = capture
            .compile_to_string("Main.elm", &options)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
