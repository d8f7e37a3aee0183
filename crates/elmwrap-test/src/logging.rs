//! Test logging.

use std::sync::Once;

use elmwrap_telemetry::{LogConfig, LogTarget, setup_logging};

static INIT: Once = Once::new();

/// Route `tracing` output through libtest's capture, once per test binary.
///
/// Honors `ELMWRAP_LOG` for the level. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let config = LogConfig::from_env()
            .with_target(LogTarget::Test)
            .without_ansi();
        if let Err(e) = setup_logging(&config) {
            eprintln!("test logging not installed: {e}");
        }
    });
}
