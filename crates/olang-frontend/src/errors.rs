// errors.rs
//! Frontend errors (E1xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexerError {
    #[error("unexpected character '{ch}'")]
    #[diagnostic(code(E1001))]
    UnexpectedCharacter {
        ch: char,
        #[label("not part of any token")]
        span: SourceSpan,
    },

    #[error("malformed real literal")]
    #[diagnostic(code(E1002), help("a real literal needs digits on both sides of the dot"))]
    MalformedReal {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("integer literal out of range")]
    #[diagnostic(code(E1003))]
    IntegerOutOfRange {
        #[label("does not fit in a 32-bit integer")]
        span: SourceSpan,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("unexpected token '{token}': {message}")]
    #[diagnostic(code(E1101))]
    UnexpectedToken {
        token: String,
        message: String,
        #[label("unexpected")]
        span: SourceSpan,
    },

    #[error("expected a class member, found '{token}'")]
    #[diagnostic(
        code(E1102),
        help("class bodies contain 'var', 'method', and 'this' declarations")
    )]
    ExpectedMember {
        token: String,
        #[label("not a member")]
        span: SourceSpan,
    },

    #[error("expected a statement, found '{token}'")]
    #[diagnostic(code(E1103))]
    ExpectedStatement {
        token: String,
        #[label("not a statement")]
        span: SourceSpan,
    },

    #[error("invalid assignment target")]
    #[diagnostic(
        code(E1104),
        help("only an identifier or a member access can be assigned to")
    )]
    InvalidAssignmentTarget {
        #[label("cannot assign to this expression")]
        span: SourceSpan,
    },

    #[error("lexical error")]
    #[diagnostic(code(E1105))]
    Lexical {
        #[related]
        errors: Vec<LexerError>,
        #[label("while reading this token")]
        span: SourceSpan,
    },
}
