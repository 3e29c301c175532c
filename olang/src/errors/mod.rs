// src/errors/mod.rs
//! Pipeline error staging and miette report construction.

use miette::{Diagnostic, NamedSource, Report};

/// Which stage of the pipeline failed, carrying a renderable report.
#[derive(Debug)]
pub enum PipelineError {
    Parse(Report),
    Semantic {
        /// The bare message, for the stable one-line stdout contract.
        message: String,
        report: Report,
    },
    Codegen(Report),
}

/// Attach the source text to a diagnostic so miette can render the
/// offending span.
pub fn report_with_source(
    diag: impl Diagnostic + Send + Sync + 'static,
    path: &str,
    source: &str,
) -> Report {
    Report::new(diag).with_source_code(NamedSource::new(path, source.to_string()))
}
