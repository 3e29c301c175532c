// errors.rs
//! Code generation errors (E3xxx).
//!
//! The emitter trusts the semantic model; these errors only fire when the
//! model and the AST disagree, which indicates a compiler bug rather than
//! a user mistake.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CodegenError {
    #[error("no layout for class '{name}'")]
    #[diagnostic(code(E3001))]
    MissingLayout { name: String },

    #[error("no semantic type recorded for {what}")]
    #[diagnostic(code(E3002))]
    MissingType { what: String },
}
