//! QuickJS-backed [`ScriptSandbox`].
//!
//! Each instance gets its own runtime and context, with a memory cap. The
//! host environment (`prelude.js`) provides a virtual-clock `setTimeout`,
//! a `console` routed to `tracing`, and the boot/send entry points the
//! Rust side calls. Values cross the boundary as JSON text.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Function, Runtime};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::sandbox::{OutboundMessage, PortSpec, ScriptSandbox, WorkerInstance};

const PRELUDE: &str = include_str!("quickjs/prelude.js");

/// Default heap cap per worker (64 MiB).
pub const DEFAULT_MEMORY_LIMIT: usize = 67_108_864;

/// Default number of timer callbacks one boot or send may run.
pub const DEFAULT_TIMER_BUDGET: u32 = 10_000;

const CONSOLE_TARGET: &str = "elmwrap_worker::console";

/// Runs workers in an embedded QuickJS engine.
#[derive(Debug, Clone)]
pub struct QuickJsSandbox {
    memory_limit: usize,
    timer_budget: u32,
}

impl Default for QuickJsSandbox {
    fn default() -> Self {
        Self {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            timer_budget: DEFAULT_TIMER_BUDGET,
        }
    }
}

impl QuickJsSandbox {
    /// Sandbox with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap each worker's heap at `bytes`.
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    /// Cap the timer callbacks a single boot or send may run.
    ///
    /// A worker that keeps rescheduling itself fails with
    /// [`WorkerError::Script`] instead of spinning forever.
    #[must_use]
    pub fn with_timer_budget(mut self, callbacks: u32) -> Self {
        self.timer_budget = callbacks;
        self
    }
}

impl ScriptSandbox for QuickJsSandbox {
    fn instantiate(
        &self,
        script: &str,
        module_name: &str,
        flags: Option<&Value>,
    ) -> WorkerResult<Box<dyn WorkerInstance>> {
        let worker = QuickJsWorker::boot(self, script, module_name, flags)?;
        Ok(Box::new(worker))
    }
}

/// `(port, payload JSON)` pairs pushed by `__elmwrapEmit`.
type Outbox = Rc<RefCell<VecDeque<(String, String)>>>;

struct QuickJsWorker {
    // Dropped before the runtime.
    context: Context,
    runtime: Runtime,
    outbox: Outbox,
    ports: Vec<PortSpec>,
    timer_budget: u32,
}

fn caught(e: CaughtError<'_>) -> WorkerError {
    WorkerError::Script(e.to_string())
}

/// The exception left pending by a failed promise job.
fn job_failure(ctx: &Ctx<'_>) -> WorkerError {
    Err::<(), _>(rquickjs::Error::Exception)
        .catch(ctx)
        .map_or_else(caught, |()| {
            WorkerError::Script("pending promise job failed".into())
        })
}

fn engine_error(e: rquickjs::Error) -> WorkerError {
    WorkerError::Script(e.to_string())
}

fn install_host_functions(ctx: &Ctx<'_>, outbox: &Outbox) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    let queue = Rc::clone(outbox);
    globals.set(
        "__elmwrapEmit",
        Function::new(ctx.clone(), move |port: String, payload: String| {
            queue.borrow_mut().push_back((port, payload));
        })?,
    )?;

    globals.set(
        "__elmwrapLog",
        Function::new(ctx.clone(), |level: String, line: String| {
            match level.as_str() {
                "error" => error!(target: CONSOLE_TARGET, "{line}"),
                "warn" => warn!(target: CONSOLE_TARGET, "{line}"),
                "debug" => debug!(target: CONSOLE_TARGET, "{line}"),
                _ => info!(target: CONSOLE_TARGET, "{line}"),
            }
        })?,
    )?;

    Ok(())
}

impl QuickJsWorker {
    fn boot(
        config: &QuickJsSandbox,
        script: &str,
        module_name: &str,
        flags: Option<&Value>,
    ) -> WorkerResult<Self> {
        let runtime = Runtime::new().map_err(engine_error)?;
        runtime.set_memory_limit(config.memory_limit);
        let context = Context::full(&runtime).map_err(engine_error)?;
        let outbox = Outbox::default();
        let flags_json = flags.map(serde_json::to_string).transpose()?;

        let ports_json = context.with(|ctx| -> WorkerResult<Option<String>> {
            install_host_functions(&ctx, &outbox)
                .catch(&ctx)
                .map_err(caught)?;
            ctx.eval::<(), _>(PRELUDE).catch(&ctx).map_err(caught)?;
            ctx.eval::<(), _>(script).catch(&ctx).map_err(caught)?;

            let boot: Function = ctx
                .globals()
                .get("__elmwrapBoot")
                .catch(&ctx)
                .map_err(caught)?;
            boot.call((module_name, flags_json, config.timer_budget))
                .catch(&ctx)
                .map_err(caught)
        })?;

        let Some(ports_json) = ports_json else {
            return Err(WorkerError::ModuleNotFound {
                module: module_name.to_owned(),
            });
        };
        let ports: Vec<PortSpec> = serde_json::from_str(&ports_json)?;
        debug!(module = module_name, ports = ports.len(), "worker started");

        let worker = Self {
            context,
            runtime,
            outbox,
            ports,
            timer_budget: config.timer_budget,
        };
        worker.run_pending_jobs()?;
        Ok(worker)
    }

    /// Run queued promise jobs to completion.
    fn run_pending_jobs(&self) -> WorkerResult<()> {
        while self.runtime.is_job_pending() {
            self.runtime
                .execute_pending_job()
                .map_err(|job| job.0.with(|ctx| job_failure(&ctx)))?;
        }
        Ok(())
    }
}

impl WorkerInstance for QuickJsWorker {
    fn ports(&self) -> &[PortSpec] {
        &self.ports
    }

    fn drain_outbound(&mut self) -> WorkerResult<Vec<OutboundMessage>> {
        self.run_pending_jobs()?;
        let emitted: Vec<(String, String)> = self.outbox.borrow_mut().drain(..).collect();
        emitted
            .into_iter()
            .map(|(port, payload)| {
                Ok(OutboundMessage {
                    port,
                    payload: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }

    fn send(&mut self, port: &str, payload: &Value) -> WorkerResult<()> {
        let payload = serde_json::to_string(payload)?;
        let budget = self.timer_budget;
        self.context.with(|ctx| -> WorkerResult<()> {
            let send: Function = ctx
                .globals()
                .get("__elmwrapSend")
                .catch(&ctx)
                .map_err(caught)?;
            send.call::<_, ()>((port, payload, budget))
                .catch(&ctx)
                .map_err(caught)
        })?;
        self.run_pending_jobs()
    }
}
