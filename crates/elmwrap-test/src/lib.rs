//! Shared test utilities for elmwrap.
//!
//! Add to a crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! elmwrap-test.workspace = true
//! ```
//!
//! Then, in a test:
//!
//! ```rust,ignore
//! use elmwrap_test::FakeCompiler;
//!
//! #[tokio::test]
//! async fn compiles_parent() {
//!     let fake = FakeCompiler::shared();
//!     let options = CompileOptions::new()
//!         .with_path_to_elm(fake.executable())
//!         .with_cwd(fake.fixtures_dir());
//!     let js = compile_to_string(fake.fixture("Parent.elm"), &options).await.unwrap();
//!     assert!(!js.is_empty());
//! }
//! ```
//!
//! The only elmwrap dependency is `elmwrap-telemetry`, so both the compiler
//! and worker crates can take this crate as a dev-dependency.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fake_compiler;
pub mod fixtures;
pub mod logging;

pub use fake_compiler::{FakeCompiler, NOISY_STDERR_BYTES};
pub use fixtures::{WORKER_GREETING, worker_script};
pub use logging::init_test_logging;
