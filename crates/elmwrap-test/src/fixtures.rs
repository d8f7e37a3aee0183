//! Elm sources and compiled-output fixtures.

use std::io;
use std::path::Path;

/// Message the fixture worker sends on `reportFromWorker` after start-up.
pub const WORKER_GREETING: &str = "it's alive!";

/// Placeholder replaced by the module name in [`WORKER_JS_TEMPLATE`].
pub(crate) const MODULE_PLACEHOLDER: &str = "__ELMWRAP_MODULE__";

/// Compiled output in the shape the Elm compiler produces for a headless
/// worker: an IIFE that registers `Elm.<Module>.init`.
///
/// Ports:
/// - `reportFromWorker` (outbound): sends [`WORKER_GREETING`] once after
///   start-up, then the flags if any were given.
/// - `echoFromWorker` (outbound): echoes whatever arrives on `toWorker`.
/// - `toWorker` (inbound).
///
/// The text contains no `$`, backslash or backtick so it can be embedded
/// verbatim in a shell here-document.
pub(crate) const WORKER_JS_TEMPLATE: &str = r#"(function(scope){
'use strict';
function outgoingPort() {
  var subs = [];
  return {
    subscribe: function (callback) { subs.push(callback); },
    unsubscribe: function (callback) {
      subs = subs.filter(function (s) { return s !== callback; });
    },
    emit: function (value) {
      subs.slice().forEach(function (s) { s(value); });
    }
  };
}
function init(options) {
  var flags = options ? options.flags : undefined;
  var report = outgoingPort();
  var echo = outgoingPort();
  setTimeout(function () {
    report.emit("it's alive!");
    if (flags !== undefined) { report.emit(flags); }
  }, 0);
  return {
    ports: {
      reportFromWorker: { subscribe: report.subscribe, unsubscribe: report.unsubscribe },
      echoFromWorker: { subscribe: echo.subscribe, unsubscribe: echo.unsubscribe },
      toWorker: { send: function (value) { echo.emit(value); } }
    }
  };
}
scope['Elm'] = scope['Elm'] || {};
scope['Elm']['__ELMWRAP_MODULE__'] = { init: init };
}(this));
"#;

/// Compiled worker output registering `module_name`.
#[must_use]
pub fn worker_script(module_name: &str) -> String {
    WORKER_JS_TEMPLATE.replace(MODULE_PLACEHOLDER, module_name)
}

const ELM_JSON: &str = r#"{
    "type": "application",
    "source-directories": ["."],
    "elm-version": "0.19.1",
    "dependencies": {
        "direct": {
            "elm/core": "1.0.5",
            "elm/html": "1.0.0"
        },
        "indirect": {
            "elm/json": "1.1.3",
            "elm/virtual-dom": "1.0.3"
        }
    },
    "test-dependencies": { "direct": {}, "indirect": {} }
}
"#;

const PARENT_ELM: &str = r#"module Parent exposing (main)

import Html exposing (text)


main =
    text "parent"
"#;

const BAD_ELM: &str = r"module Bad exposing (main)


main =
    if then else
";

const TYPE_ERROR_ELM: &str = r#"module TypeError exposing (main)

import Html exposing (text)


main =
    text (1 + "two")
"#;

const NOISY_ELM: &str = r"module Noisy exposing (main)


main =
    noisy
";

const BINARY_ELM: &str = r#"module Binary exposing (main)

import Html exposing (text)


main =
    text "binary"
"#;

const BASIC_WORKER_ELM: &str = r#"port module BasicWorker exposing (main)

import Platform


port reportFromWorker : String -> Cmd msg


main : Program () () ()
main =
    Platform.worker
        { init = \_ -> ( (), reportFromWorker "it's alive!" )
        , update = \_ model -> ( model, Cmd.none )
        , subscriptions = \_ -> Sub.none
        }
"#;

/// Write the Elm project fixtures into `dir`.
pub(crate) fn write_sources(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (name, contents) in [
        ("elm.json", ELM_JSON),
        ("Parent.elm", PARENT_ELM),
        ("Bad.elm", BAD_ELM),
        ("TypeError.elm", TYPE_ERROR_ELM),
        ("Noisy.elm", NOISY_ELM),
        ("Binary.elm", BINARY_ELM),
        ("BasicWorker.elm", BASIC_WORKER_ELM),
    ] {
        std::fs::write(dir.join(name), contents)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_script_names_module() {
        let script = worker_script("BasicWorker");
        assert!(script.contains("scope['Elm']['BasicWorker']"));
        assert!(!script.contains(MODULE_PLACEHOLDER));
    }

    #[test]
    fn template_is_heredoc_safe() {
        assert!(!WORKER_JS_TEMPLATE.contains(['$', '\\', '`']));
    }
}
