//! O language frontend: lexer, parser, and AST.

pub mod ast;
pub mod errors;
pub mod intern;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{
    Block, ClassDecl, CtorDecl, Expr, ExprKind, FieldDecl, Member, MethodBody, MethodDecl, NodeId,
    Param, Program, Stmt, StmtKind, TypeExpr, TypeExprKind,
};
pub use errors::{LexerError, ParserError};
pub use intern::{Interner, Symbol};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use span::Span;
pub use token::{Token, TokenType};
