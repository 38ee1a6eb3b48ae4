//! `presto_shell` — command-line driver for the presto front-end.
//!
//! Parses a script file (resolving its includes relative to the script's
//! directory) and reports either the shape of the parsed program or the
//! first located error.  Execution is left to the embedding host; this tool
//! exists to check scripts and inspect what the parser produced.

use std::path::Path;
use std::process::ExitCode;

use presto_core::engine::ScriptEngine;
use presto_core::include::ProjectFolderProvider;

fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: presto_shell <script.js>");
        return ExitCode::FAILURE;
    };

    let code = match std::fs::read_to_string(&path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let root = Path::new(&path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut engine = ScriptEngine::with_provider(Box::new(ProjectFolderProvider::new(root)));

    match engine.compile(&code) {
        Ok(script) => {
            let tables = engine.symbol_tables();
            println!(
                "{path}: {} top-level statements, {} constants, {} registers, {} inline functions",
                script.root.statements.len(),
                tables.root.const_objects.len(),
                tables.root.var_register.num_used_registers(),
                tables.root.inline_functions.len(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}
