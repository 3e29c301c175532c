// errors.rs
//! Semantic analysis errors (E2xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("class '{name}' is declared more than once")]
    #[diagnostic(code(E2001))]
    DuplicateClass {
        name: String,
        #[label("second declaration")]
        span: SourceSpan,
    },

    #[error("class '{name}' extends unknown type '{base}'")]
    #[diagnostic(code(E2002))]
    UnknownBase {
        name: String,
        base: String,
        #[label("base is not a declared class or built-in")]
        span: SourceSpan,
    },

    #[error("inheritance cycle or unresolved base involving '{name}'")]
    #[diagnostic(
        code(E2003),
        help("check the 'extends' chain for a class that depends on itself")
    )]
    InheritanceCycleOrUnresolved {
        name: String,
        #[label("cannot be ordered for analysis")]
        span: SourceSpan,
    },

    #[error("field '{name}' is declared more than once")]
    #[diagnostic(code(E2004))]
    DuplicateField {
        name: String,
        #[label("second declaration")]
        span: SourceSpan,
    },

    #[error("duplicate forward declaration of method '{name}'")]
    #[diagnostic(code(E2005))]
    DuplicateForwardDeclaration {
        name: String,
        #[label("this signature is already declared")]
        span: SourceSpan,
    },

    #[error("duplicate implementation of method '{name}'")]
    #[diagnostic(code(E2006))]
    DuplicateImplementation {
        name: String,
        #[label("this signature already has a body")]
        span: SourceSpan,
    },

    #[error("method '{name}' is declared with return type {expected} but defined with {found}")]
    #[diagnostic(code(E2007))]
    ReturnTypeMismatchBetweenDeclarations {
        name: String,
        expected: String,
        found: String,
        #[label("return type differs from the earlier declaration")]
        span: SourceSpan,
    },

    #[error("duplicate constructor signature in class '{class}'")]
    #[diagnostic(code(E2008))]
    DuplicateConstructorSignature {
        class: String,
        #[label("a constructor with these parameter types already exists")]
        span: SourceSpan,
    },

    #[error("implementation of '{name}' does not match any declared signature")]
    #[diagnostic(code(E2009))]
    SignatureNotDeclared {
        name: String,
        #[label("no matching declaration")]
        span: SourceSpan,
    },

    #[error("undeclared identifier '{name}'")]
    #[diagnostic(code(E2010))]
    UndeclaredIdentifier {
        name: String,
        #[label("not a variable, parameter, or field")]
        span: SourceSpan,
    },

    #[error("type '{name}' is not declared")]
    #[diagnostic(code(E2011))]
    TypeNotDeclared {
        name: String,
        #[label("unknown type")]
        span: SourceSpan,
    },

    #[error("unknown class '{name}'")]
    #[diagnostic(code(E2012))]
    UnknownClass {
        name: String,
        #[label("not a constructible class")]
        span: SourceSpan,
    },

    #[error("method '{name}' is not declared on type '{receiver}'")]
    #[diagnostic(code(E2013))]
    MethodNotDeclared {
        name: String,
        receiver: String,
        #[label("no such method")]
        span: SourceSpan,
    },

    #[error("no overload of '{name}' matches the argument types")]
    #[diagnostic(code(E2014))]
    NoMatchingOverload {
        name: String,
        #[label("arguments match no declared signature")]
        span: SourceSpan,
    },

    #[error("expected {expected} arguments, found {found}")]
    #[diagnostic(code(E2015))]
    ArgumentCountMismatch {
        expected: usize,
        found: usize,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(E2016))]
    TypeMismatch {
        expected: String,
        found: String,
        #[label("type mismatch")]
        span: SourceSpan,
    },

    #[error("initializer of '{name}' has no value")]
    #[diagnostic(code(E2017))]
    VoidInitializer {
        name: String,
        #[label("void expression")]
        span: SourceSpan,
    },

    #[error("cannot assign to a void target")]
    #[diagnostic(code(E2018))]
    VoidAssignmentTarget {
        #[label("target has type Void")]
        span: SourceSpan,
    },

    #[error("'return' outside of a method body")]
    #[diagnostic(code(E2019))]
    ReturnOutsideMethod {
        #[label("not inside a method")]
        span: SourceSpan,
    },

    #[error("void method returns a value")]
    #[diagnostic(code(E2020))]
    ReturnValueInVoid {
        #[label("this method has no return type")]
        span: SourceSpan,
    },

    #[error("missing return value, expected {expected}")]
    #[diagnostic(code(E2021))]
    MissingReturnValue {
        expected: String,
        #[label("a value of type {expected} is required")]
        span: SourceSpan,
    },

    #[error("expression-bodied method '{name}' needs a declared return type")]
    #[diagnostic(code(E2022))]
    ExpressionBodyWithoutReturnType {
        name: String,
        #[label("add ': Type' before '=>'")]
        span: SourceSpan,
    },

    #[error("variable '{name}' is already declared in this scope")]
    #[diagnostic(code(E2023))]
    DuplicateVariable {
        name: String,
        #[label("second declaration")]
        span: SourceSpan,
    },

    #[error("unsupported assignment target")]
    #[diagnostic(code(E2024))]
    UnsupportedExpressionTarget {
        #[label("only identifiers and member accesses can be assigned to")]
        span: SourceSpan,
    },
}
