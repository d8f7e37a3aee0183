//! `elm make` argument construction.

use std::path::Path;

use crate::options::CompileOptions;

/// Subcommand every invocation starts with.
pub const SUBCOMMAND: &str = "make";

/// Opens the runtime-options group.
pub const RTS_START: &str = "+RTS";

/// Closes the runtime-options group.
pub const RTS_END: &str = "-RTS";

/// Build the compiler argument list for `source_path`.
///
/// The order is fixed: `make`, the source path, `--debug`, `--optimize`,
/// `--output`, `--report`, `--docs`, then the runtime options wrapped in
/// `+RTS` / `-RTS`. Unset options emit nothing, and the runtime group is
/// omitted when there are no runtime options.
///
/// This is a pure function; it performs no validation and spawns nothing.
#[must_use]
pub fn prepare_process_args(source_path: impl AsRef<Path>, options: &CompileOptions) -> Vec<String> {
    let mut args = vec![
        SUBCOMMAND.to_string(),
        path_arg(source_path.as_ref()),
    ];

    if options.debug {
        args.push("--debug".into());
    }
    if options.optimize {
        args.push("--optimize".into());
    }
    if let Some(output) = &options.output {
        args.push("--output".into());
        args.push(path_arg(output));
    }
    if let Some(report) = options.report {
        args.push("--report".into());
        args.push(report.as_str().into());
    }
    if let Some(docs) = &options.docs {
        args.push("--docs".into());
        args.push(path_arg(docs));
    }

    if !options.runtime_options.is_empty() {
        args.push(RTS_START.into());
        args.extend(options.runtime_options.iter().cloned());
        args.push(RTS_END.into());
    }

    args
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReportFormat;

    #[test]
    fn bare_invocation() {
        let args = prepare_process_args("a.elm", &CompileOptions::new());
        assert_eq!(args, vec!["make", "a.elm"]);
    }

    #[test]
    fn runtime_options_are_wrapped_in_sentinels() {
        let options = CompileOptions::new()
            .with_verbose(true)
            .with_cwd("fixtures")
            .with_runtime_options(["-A128M", "-H128M", "-n8m"]);
        let args = prepare_process_args("a.elm", &options);
        assert_eq!(args.join(" "), "make a.elm +RTS -A128M -H128M -n8m -RTS");
    }

    #[test]
    fn empty_runtime_options_emit_no_sentinels() {
        let options = CompileOptions::new().with_runtime_options(Vec::<String>::new());
        let args = prepare_process_args("a.elm", &options);
        assert!(!args.iter().any(|a| a == RTS_START || a == RTS_END));
    }

    #[test]
    fn flags_follow_fixed_order() {
        let options = CompileOptions::new()
            .with_runtime_options(["-n8m"])
            .with_docs("docs.json")
            .with_report(ReportFormat::Json)
            .with_output("out/main.js")
            .with_optimize(true)
            .with_debug(true);
        let args = prepare_process_args("src/Main.elm", &options);
        assert_eq!(
            args,
            vec![
                "make",
                "src/Main.elm",
                "--debug",
                "--optimize",
                "--output",
                "out/main.js",
                "--report",
                "json",
                "--docs",
                "docs.json",
                "+RTS",
                "-n8m",
                "-RTS",
            ]
        );
    }

    #[test]
    fn is_deterministic() {
        let options = CompileOptions::new()
            .with_output("main.js")
            .with_runtime_options(["-A64M"]);
        assert_eq!(
            prepare_process_args("Main.elm", &options),
            prepare_process_args("Main.elm", &options)
        );
    }

    #[test]
    fn options_without_flags_emit_nothing() {
        let options = CompileOptions::new()
            .with_cwd("/tmp")
            .with_path_to_elm("/usr/bin/elm")
            .with_verbose(true);
        assert_eq!(prepare_process_args("Main.elm", &options).len(), 2);
    }
}
