//! Compile-then-instantiate pipeline for headless workers.

use std::path::Path;
use std::sync::Arc;

use elmwrap_compiler::{CompileOptions, OutputCapture};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::WorkerResult;
use crate::handle::WorkerHandle;
use crate::sandbox::ScriptSandbox;

/// Compiles Elm worker sources and starts them in a [`ScriptSandbox`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use elmwrap_worker::{QuickJsSandbox, WorkerEvaluator};
///
/// # async fn run() -> elmwrap_worker::WorkerResult<()> {
/// let evaluator = WorkerEvaluator::new(Arc::new(QuickJsSandbox::new()))
///     .with_flags(serde_json::json!({ "seed": 42 }));
/// let mut worker = evaluator
///     .compile("workers", "src/Worker.elm", "Worker")
///     .await?;
/// worker.port("results")?.subscribe(|value| println!("{value}"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WorkerEvaluator {
    sandbox: Arc<dyn ScriptSandbox>,
    options: CompileOptions,
    capture: OutputCapture,
    flags: Option<Value>,
}

impl WorkerEvaluator {
    /// Evaluator backed by `sandbox`, with default compile options.
    #[must_use]
    pub fn new(sandbox: Arc<dyn ScriptSandbox>) -> Self {
        Self {
            sandbox,
            options: CompileOptions::default(),
            capture: OutputCapture::new(),
            flags: None,
        }
    }

    /// Base compile options. `cwd` and `output` are overridden per call.
    #[must_use]
    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Flags handed to the worker's `init`.
    #[must_use]
    pub fn with_flags(mut self, flags: Value) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Capture settings for the compile step (temp directory).
    #[must_use]
    pub fn with_capture(mut self, capture: OutputCapture) -> Self {
        self.capture = capture;
        self
    }

    /// Compile `source` from `base_dir` and instantiate `module_name`.
    ///
    /// Relative `source` paths resolve against `base_dir`, which is also the
    /// compiler's working directory.
    ///
    /// # Errors
    ///
    /// Compile failures come back as [`crate::WorkerError::Compiler`] with
    /// the compiler error untouched; nothing is instantiated in that case.
    /// Otherwise the errors of [`WorkerEvaluator::evaluate`].
    pub async fn compile(
        &self,
        base_dir: impl AsRef<Path>,
        source: impl AsRef<Path>,
        module_name: &str,
    ) -> WorkerResult<WorkerHandle> {
        let mut options = self.options.clone();
        options.cwd = Some(base_dir.as_ref().to_path_buf());
        options.output = None;

        let script = self.capture.compile_to_string(source, &options).await?;
        debug!(module = module_name, bytes = script.len(), "worker compiled");
        self.evaluate(&script, module_name)
    }

    /// Instantiate `module_name` from already compiled output.
    ///
    /// # Errors
    ///
    /// [`crate::WorkerError::ModuleNotFound`] if the output does not define
    /// the module, or whatever the sandbox raised while starting it.
    pub fn evaluate(&self, script: &str, module_name: &str) -> WorkerResult<WorkerHandle> {
        let instance = self
            .sandbox
            .instantiate(script, module_name, self.flags.as_ref())?;
        let handle = WorkerHandle::new(module_name, instance)?;
        info!(
            module = module_name,
            ports = ?handle.port_names().collect::<Vec<_>>(),
            "worker instantiated"
        );
        Ok(handle)
    }
}

#[cfg(feature = "quickjs")]
impl Default for WorkerEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(crate::QuickJsSandbox::new()))
    }
}

impl std::fmt::Debug for WorkerEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerEvaluator")
            .field("options", &self.options)
            .field("capture", &self.capture)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
