// src/commands/compile.rs
//
// The parse → analyze → emit pipeline and the file-level compile command.
//
// Exit behavior: parse and semantic failures are reported on stdout (one
// stable line) with exit code 0; only I/O failures are process failures.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use olang_codegen::Emitter;
use olang_frontend::Parser;
use olang_sema::Analyzer;

use crate::errors::{PipelineError, report_with_source};

/// Compiled when the CLI is invoked without an input file.
pub const DEFAULT_SAMPLE: &str = "class Main is this is Integer(42).Print() end end";

/// Compile one file (or the built-in sample) and write the `.ll` next to
/// the input.
pub fn compile_command(input: Option<&Path>, output: Option<&Path>) -> ExitCode {
    let (source, label, out_path) = match input {
        Some(path) => {
            let source = match fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: could not read '{}': {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            let out = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path.with_extension("ll"));
            (source, path.display().to_string(), out)
        }
        None => (
            DEFAULT_SAMPLE.to_string(),
            "<sample>".to_string(),
            output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("output.ll")),
        ),
    };

    let ir = match compile_source(&source, &label) {
        Ok(ir) => ir,
        Err(PipelineError::Parse(report)) => {
            println!("Parse failed");
            eprintln!("{report:?}");
            return ExitCode::SUCCESS;
        }
        Err(PipelineError::Semantic { message, report }) => {
            println!("Semantic error: {message}");
            eprintln!("{report:?}");
            return ExitCode::SUCCESS;
        }
        Err(PipelineError::Codegen(report)) => {
            eprintln!("internal error: {report:?}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::write(&out_path, ir) {
        eprintln!("error: could not write '{}': {}", out_path.display(), e);
        return ExitCode::FAILURE;
    }
    tracing::debug!(output = %out_path.display(), "compilation finished");
    ExitCode::SUCCESS
}

/// Run the full pipeline over one source text.
pub fn compile_source(source: &str, path: &str) -> Result<String, PipelineError> {
    let mut parser = Parser::new(source);
    let mut program = parser
        .parse_program()
        .map_err(|e| PipelineError::Parse(report_with_source(e.error, path, source)))?;
    let interner = parser.into_interner();
    tracing::debug!(classes = program.classes.len(), "parsed");

    let mut analyzer = Analyzer::new(&interner);
    let model = analyzer.analyze(&mut program).map_err(|e| {
        let message = e.to_string();
        PipelineError::Semantic {
            message,
            report: report_with_source(e.error, path, source),
        }
    })?;
    tracing::debug!("analysis finished");

    Emitter::new(&program, &interner, &model)
        .emit()
        .map_err(|e| PipelineError::Codegen(report_with_source(e, path, source)))
}
