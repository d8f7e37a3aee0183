//! End-to-end worker tests against the fake `elm` from `elmwrap-test`.

#![cfg(unix)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use elmwrap_compiler::{
    CompileOptions, CompilerError, DiagnosticKind, OutputCapture, compile_to_string,
};
use elmwrap_test::{FakeCompiler, init_test_logging};
use elmwrap_worker::{
    OutboundMessage, PortDirection, PortSpec, ScriptSandbox, WorkerError, WorkerEvaluator,
    WorkerInstance, WorkerResult,
};
use serde_json::{Value, json};

fn fake() -> &'static FakeCompiler {
    init_test_logging();
    FakeCompiler::shared()
}

fn fake_options() -> CompileOptions {
    CompileOptions::new().with_path_to_elm(fake().executable())
}

/// Records what it was asked to instantiate; the instance emits the module
/// name once.
#[derive(Default)]
struct MockSandbox {
    calls: Mutex<Vec<(String, Option<Value>)>>,
}

struct MockInstance {
    ports: Vec<PortSpec>,
    pending: Vec<OutboundMessage>,
}

impl ScriptSandbox for MockSandbox {
    fn instantiate(
        &self,
        script: &str,
        module_name: &str,
        flags: Option<&Value>,
    ) -> WorkerResult<Box<dyn WorkerInstance>> {
        self.calls
            .lock()
            .unwrap()
            .push((module_name.to_owned(), flags.cloned()));
        if !script.contains(&format!("['{module_name}']")) {
            return Err(WorkerError::ModuleNotFound {
                module: module_name.to_owned(),
            });
        }
        Ok(Box::new(MockInstance {
            ports: vec![PortSpec {
                name: "out".into(),
                direction: PortDirection::Outbound,
            }],
            pending: vec![OutboundMessage {
                port: "out".into(),
                payload: json!(module_name),
            }],
        }))
    }
}

impl WorkerInstance for MockInstance {
    fn ports(&self) -> &[PortSpec] {
        &self.ports
    }

    fn drain_outbound(&mut self) -> WorkerResult<Vec<OutboundMessage>> {
        Ok(std::mem::take(&mut self.pending))
    }

    fn send(&mut self, port: &str, _payload: &Value) -> WorkerResult<()> {
        Err(WorkerError::UnknownPort { port: port.into() })
    }
}

fn collect(handle: &mut elmwrap_worker::WorkerHandle, port: &str) -> Rc<RefCell<Vec<Value>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    handle
        .port(port)
        .unwrap()
        .subscribe(move |value: &Value| sink.borrow_mut().push(value.clone()))
        .unwrap();
    seen
}

// ---------------------------------------------------------------------------
// Mock sandbox
// ---------------------------------------------------------------------------

#[tokio::test]
async fn compiled_output_reaches_the_sandbox() {
    let fake = fake();
    let sandbox = Arc::new(MockSandbox::default());
    let evaluator = WorkerEvaluator::new(sandbox.clone())
        .with_compile_options(fake_options())
        .with_flags(json!({ "seed": 1 }));

    let mut handle = evaluator
        .compile(fake.fixtures_dir(), "BasicWorker.elm", "BasicWorker")
        .await
        .unwrap();

    assert_eq!(handle.module_name(), "BasicWorker");
    assert_eq!(*collect(&mut handle, "out").borrow(), vec![json!("BasicWorker")]);
    assert_eq!(
        *sandbox.calls.lock().unwrap(),
        vec![("BasicWorker".to_owned(), Some(json!({ "seed": 1 })))]
    );
}

#[tokio::test]
async fn compile_errors_propagate_unchanged() {
    let fake = fake();
    let sandbox = Arc::new(MockSandbox::default());
    let evaluator = WorkerEvaluator::new(sandbox.clone()).with_compile_options(fake_options());

    let err = evaluator
        .compile(fake.fixtures_dir(), "Bad.elm", "Bad")
        .await
        .unwrap_err();

    let expected = compile_to_string(
        "Bad.elm",
        &fake_options().with_cwd(fake.fixtures_dir()),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), expected.to_string());
    match err {
        WorkerError::Compiler(CompilerError::Compilation(failure)) => {
            assert_eq!(failure.kind(), DiagnosticKind::Parse);
        }
        other => panic!("expected a compilation error, got {other:?}"),
    }
    assert!(sandbox.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_compiler_is_a_compiler_error() {
    let evaluator = WorkerEvaluator::new(Arc::new(MockSandbox::default()))
        .with_compile_options(CompileOptions::new().with_path_to_elm("/path/to/non-existing/elm"));

    let err = evaluator
        .compile(fake().fixtures_dir(), "BasicWorker.elm", "BasicWorker")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Compiler(ref e) if e.is_validation()));
}

#[tokio::test]
async fn unknown_module_is_reported() {
    let fake = fake();
    let evaluator =
        WorkerEvaluator::new(Arc::new(MockSandbox::default())).with_compile_options(fake_options());

    let err = evaluator
        .compile(fake.fixtures_dir(), "BasicWorker.elm", "SomethingElse")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::ModuleNotFound { ref module } if module == "SomethingElse"));
}

#[tokio::test]
async fn compile_leaves_no_temp_artifacts() {
    let fake = fake();
    let scratch = tempfile::tempdir().unwrap();
    let evaluator = WorkerEvaluator::new(Arc::new(MockSandbox::default()))
        .with_compile_options(fake_options())
        .with_capture(OutputCapture::new().with_temp_dir(scratch.path()));

    evaluator
        .compile(fake.fixtures_dir(), "BasicWorker.elm", "BasicWorker")
        .await
        .unwrap();
    assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
}

// ---------------------------------------------------------------------------
// QuickJS
// ---------------------------------------------------------------------------

#[cfg(feature = "quickjs")]
mod quickjs {
    use elmwrap_test::WORKER_GREETING;
    use elmwrap_worker::QuickJsSandbox;

    use super::*;

    fn evaluator() -> WorkerEvaluator {
        WorkerEvaluator::new(Arc::new(QuickJsSandbox::new())).with_compile_options(fake_options())
    }

    #[tokio::test]
    async fn basic_worker_reports_once() {
        let fake = fake();
        let mut handle = evaluator()
            .compile(fake.fixtures_dir(), "BasicWorker.elm", "BasicWorker")
            .await
            .unwrap();

        let seen = collect(&mut handle, "reportFromWorker");
        assert_eq!(*seen.borrow(), vec![json!(WORKER_GREETING)]);
    }

    #[tokio::test]
    async fn inbound_port_round_trip() {
        let fake = fake();
        let mut handle = evaluator()
            .compile(fake.fixtures_dir(), fake.fixture("BasicWorker.elm"), "BasicWorker")
            .await
            .unwrap();
        let echoed = collect(&mut handle, "echoFromWorker");

        handle.port("toWorker").unwrap().send("ping").unwrap();
        handle.send("toWorker", &json!({ "n": 2 })).unwrap();

        assert_eq!(*echoed.borrow(), vec![json!("ping"), json!({ "n": 2 })]);
    }

    #[tokio::test]
    async fn flags_are_delivered() {
        let fake = fake();
        let mut handle = evaluator()
            .with_flags(json!([1, 2, 3]))
            .compile(fake.fixtures_dir(), "BasicWorker.elm", "BasicWorker")
            .await
            .unwrap();

        let seen = collect(&mut handle, "reportFromWorker");
        assert_eq!(*seen.borrow(), vec![json!(WORKER_GREETING), json!([1, 2, 3])]);
    }

    #[tokio::test]
    async fn missing_module_in_real_output() {
        let fake = fake();
        let err = evaluator()
            .compile(fake.fixtures_dir(), "BasicWorker.elm", "Nope")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::ModuleNotFound { .. }));
    }
}
