// parser.rs

use crate::ast::*;
use crate::errors::{LexerError, ParserError};
use crate::intern::{Interner, Symbol};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenType};

/// A parse error wrapping a miette-enabled [`ParserError`].
#[derive(Debug)]
pub struct ParseError {
    pub error: ParserError,
    pub span: Span,
}

impl ParseError {
    pub fn new(error: ParserError, span: Span) -> Self {
        Self { error, span }
    }
}

/// Hand-written recursive-descent parser for O programs.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    interner: Interner,
    next_node_id: u32,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::new(TokenType::Eof, "", Span::default()),
            interner: Interner::new(),
            next_node_id: 0,
        }
    }

    /// Consume the parser, handing out the interner for later phases.
    pub fn into_interner(self) -> Interner {
        self.interner
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut classes = Vec::new();
        while !self.check(TokenType::Eof) {
            classes.push(self.class_decl()?);
        }

        if self.lexer.has_errors() {
            let collected = self.lexer.take_errors();
            let span = collected[0].1;
            let errors: Vec<LexerError> = collected.into_iter().map(|(e, _)| e).collect();
            return Err(ParseError::new(ParserError::Lexical { errors, span: span.into() }, span));
        }

        Ok(Program {
            classes,
            next_node_id: self.next_node_id,
        })
    }

    // ===== Declarations =====

    fn class_decl(&mut self) -> Result<ClassDecl, ParseError> {
        let start_span = self.current.span;
        self.consume(TokenType::KwClass, "expected 'class'")?;

        let name_token = self.current.clone();
        self.consume(TokenType::Identifier, "expected class name")?;
        let name = self.interner.intern(&name_token.lexeme);

        let base = if self.match_token(TokenType::KwExtends) {
            let base_token = self.current.clone();
            self.consume(TokenType::Identifier, "expected base class name")?;
            Some(self.interner.intern(&base_token.lexeme))
        } else {
            None
        };

        self.consume(TokenType::KwIs, "expected 'is' after class header")?;

        let mut members = Vec::new();
        while !self.check(TokenType::KwEnd) && !self.check(TokenType::Eof) {
            members.push(self.member()?);
        }

        self.consume(TokenType::KwEnd, "expected 'end' to close class body")?;
        let span = start_span.merge(self.previous.span);

        Ok(ClassDecl {
            id: self.next_id(),
            name,
            base,
            members,
            span,
        })
    }

    fn member(&mut self) -> Result<Member, ParseError> {
        match self.current.ty {
            TokenType::KwVar => {
                let (id, name, init, span) = self.var_decl()?;
                Ok(Member::Field(FieldDecl {
                    id,
                    name,
                    init,
                    span,
                }))
            }
            TokenType::KwMethod => self.method_decl().map(Member::Method),
            TokenType::KwThis => self.ctor_decl().map(Member::Ctor),
            _ => Err(ParseError::new(
                ParserError::ExpectedMember {
                    token: self.current.ty.as_str().to_string(),
                    span: self.current.span.into(),
                },
                self.current.span,
            )),
        }
    }

    /// `var name : initializer` — shared by field and local declarations.
    fn var_decl(&mut self) -> Result<(NodeId, Symbol, Expr, Span), ParseError> {
        let start_span = self.current.span;
        self.advance(); // consume 'var'

        let name_token = self.current.clone();
        self.consume(TokenType::Identifier, "expected variable name")?;
        let name = self.interner.intern(&name_token.lexeme);

        self.consume(TokenType::Colon, "expected ':' before initializer")?;
        let init = self.expression()?;
        let span = start_span.merge(init.span);

        Ok((self.next_id(), name, init, span))
    }

    fn method_decl(&mut self) -> Result<MethodDecl, ParseError> {
        let start_span = self.current.span;
        self.advance(); // consume 'method'

        let name_token = self.current.clone();
        self.consume(TokenType::Identifier, "expected method name")?;
        let name = self.interner.intern(&name_token.lexeme);

        let params = if self.check(TokenType::LParen) {
            self.param_list()?
        } else {
            Vec::new()
        };

        let return_type = if self.match_token(TokenType::Colon) {
            Some(self.type_ref()?)
        } else {
            None
        };

        let body = match self.current.ty {
            TokenType::KwIs => {
                self.advance();
                let block = self.body(&[TokenType::KwEnd])?;
                self.consume(TokenType::KwEnd, "expected 'end' to close method body")?;
                Some(MethodBody::Block(block))
            }
            TokenType::FatArrow => {
                self.advance();
                let expr = self.expression()?;
                Some(MethodBody::Expr(Box::new(expr)))
            }
            // Anything else means a forward declaration; the class-body
            // loop validates the next token.
            _ => None,
        };

        let span = start_span.merge(self.previous.span);
        Ok(MethodDecl {
            id: self.next_id(),
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    fn ctor_decl(&mut self) -> Result<CtorDecl, ParseError> {
        let start_span = self.current.span;
        self.advance(); // consume 'this'

        let params = if self.check(TokenType::LParen) {
            self.param_list()?
        } else {
            Vec::new()
        };

        self.consume(TokenType::KwIs, "expected 'is' after constructor header")?;
        let body = self.body(&[TokenType::KwEnd])?;
        self.consume(TokenType::KwEnd, "expected 'end' to close constructor body")?;

        let span = start_span.merge(self.previous.span);
        Ok(CtorDecl {
            id: self.next_id(),
            params,
            body,
            span,
        })
    }

    fn param_list(&mut self) -> Result<Vec<Param>, ParseError> {
        self.consume(TokenType::LParen, "expected '('")?;
        let mut params = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                let start_span = self.current.span;
                let name_token = self.current.clone();
                self.consume(TokenType::Identifier, "expected parameter name")?;
                let name = self.interner.intern(&name_token.lexeme);
                self.consume(TokenType::Colon, "expected ':' after parameter name")?;
                let ty = self.type_ref()?;
                let span = start_span.merge(self.previous.span);
                params.push(Param {
                    id: self.next_id(),
                    name,
                    ty,
                    span,
                });
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RParen, "expected ')' after parameters")?;
        Ok(params)
    }

    fn type_ref(&mut self) -> Result<TypeExpr, ParseError> {
        let start_span = self.current.span;
        let name_token = self.current.clone();
        self.consume(TokenType::Identifier, "expected type name")?;
        let name = self.interner.intern(&name_token.lexeme);

        if self.match_token(TokenType::LBracket) {
            let arg = self.type_ref()?;
            self.consume(TokenType::RBracket, "expected ']' after type argument")?;
            let span = start_span.merge(self.previous.span);
            return Ok(TypeExpr {
                kind: TypeExprKind::Generic {
                    name,
                    arg: Box::new(arg),
                },
                span,
            });
        }

        Ok(TypeExpr {
            kind: TypeExprKind::Named(name),
            span: start_span,
        })
    }

    // ===== Statements =====

    /// Parse statements until one of `stops` (or EOF) is reached.
    fn body(&mut self, stops: &[TokenType]) -> Result<Block, ParseError> {
        let start_span = self.current.span;
        let mut items = Vec::new();
        while !stops.contains(&self.current.ty) && !self.check(TokenType::Eof) {
            items.push(self.statement()?);
        }
        let span = if items.is_empty() {
            start_span
        } else {
            start_span.merge(self.previous.span)
        };
        Ok(Block { items, span })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current.ty {
            TokenType::KwVar => {
                let (id, name, init, span) = self.var_decl()?;
                Ok(Stmt {
                    id,
                    kind: StmtKind::Var { name, init },
                    span,
                })
            }
            TokenType::KwWhile => self.while_stmt(),
            TokenType::KwIf => self.if_stmt(),
            TokenType::KwReturn => self.return_stmt(),
            ty if ty.starts_expression() => self.expr_or_assign_stmt(),
            ty => Err(ParseError::new(
                ParserError::ExpectedStatement {
                    token: ty.as_str().to_string(),
                    span: self.current.span.into(),
                },
                self.current.span,
            )),
        }
    }

    fn while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start_span = self.current.span;
        self.advance(); // consume 'while'
        let cond = self.expression()?;
        self.consume(TokenType::KwLoop, "expected 'loop' after condition")?;
        let body = self.body(&[TokenType::KwEnd])?;
        self.consume(TokenType::KwEnd, "expected 'end' to close loop body")?;
        let span = start_span.merge(self.previous.span);
        Ok(Stmt {
            id: self.next_id(),
            kind: StmtKind::While { cond, body },
            span,
        })
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start_span = self.current.span;
        self.advance(); // consume 'if'
        let cond = self.expression()?;
        self.consume(TokenType::KwThen, "expected 'then' after condition")?;
        let then_body = self.body(&[TokenType::KwElse, TokenType::KwEnd])?;
        let else_body = if self.match_token(TokenType::KwElse) {
            Some(self.body(&[TokenType::KwEnd])?)
        } else {
            None
        };
        self.consume(TokenType::KwEnd, "expected 'end' to close if statement")?;
        let span = start_span.merge(self.previous.span);
        Ok(Stmt {
            id: self.next_id(),
            kind: StmtKind::If {
                cond,
                then_body,
                else_body,
            },
            span,
        })
    }

    fn return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start_span = self.current.span;
        self.advance(); // consume 'return'
        let value = if self.current.ty.starts_expression() {
            Some(self.expression()?)
        } else {
            None
        };
        let span = start_span.merge(self.previous.span);
        Ok(Stmt {
            id: self.next_id(),
            kind: StmtKind::Return(value),
            span,
        })
    }

    fn expr_or_assign_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        if self.match_token(TokenType::ColonEq) {
            if !matches!(
                expr.kind,
                ExprKind::Identifier(_) | ExprKind::FieldAccess { .. }
            ) {
                return Err(ParseError::new(
                    ParserError::InvalidAssignmentTarget {
                        span: expr.span.into(),
                    },
                    expr.span,
                ));
            }
            let value = self.expression()?;
            let span = expr.span.merge(value.span);
            return Ok(Stmt {
                id: self.next_id(),
                kind: StmtKind::Assign {
                    target: expr,
                    value,
                },
                span,
            });
        }
        let span = expr.span;
        Ok(Stmt {
            id: self.next_id(),
            kind: StmtKind::Expr(expr),
            span,
        })
    }

    // ===== Expressions =====

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        // Postfix chain: member access and member calls.
        while self.match_token(TokenType::Dot) {
            let name_token = self.current.clone();
            self.consume(TokenType::Identifier, "expected member name after '.'")?;
            let field = self.interner.intern(&name_token.lexeme);
            let access_span = expr.span.merge(name_token.span);
            let access = Expr {
                id: self.next_id(),
                kind: ExprKind::FieldAccess {
                    object: Box::new(expr),
                    field,
                },
                span: access_span,
            };
            expr = if self.check(TokenType::LParen) {
                let args = self.arg_list()?;
                let span = access_span.merge(self.previous.span);
                Expr {
                    id: self.next_id(),
                    kind: ExprKind::Call {
                        callee: Box::new(access),
                        args,
                    },
                    span,
                }
            } else {
                access
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current.clone();
        match token.ty {
            TokenType::IntLiteral => {
                self.advance();
                let value: i32 = token.lexeme.parse().map_err(|_| {
                    ParseError::new(
                        ParserError::Lexical {
                            errors: vec![LexerError::IntegerOutOfRange {
                                span: token.span.into(),
                            }],
                            span: token.span.into(),
                        },
                        token.span,
                    )
                })?;
                Ok(self.literal(ExprKind::IntLit(value), token.span))
            }
            TokenType::RealLiteral => {
                self.advance();
                let value: f64 = token
                    .lexeme
                    .parse()
                    .expect("lexer only produces digits.digits");
                Ok(self.literal(ExprKind::RealLit(value), token.span))
            }
            TokenType::KwTrue => {
                self.advance();
                Ok(self.literal(ExprKind::BoolLit(true), token.span))
            }
            TokenType::KwFalse => {
                self.advance();
                Ok(self.literal(ExprKind::BoolLit(false), token.span))
            }
            TokenType::KwThis => {
                self.advance();
                Ok(self.literal(ExprKind::This, token.span))
            }
            TokenType::Identifier => {
                self.advance();
                self.identifier_primary(&token)
            }
            TokenType::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            ty => Err(ParseError::new(
                ParserError::UnexpectedToken {
                    token: ty.as_str().to_string(),
                    message: "expected an expression".to_string(),
                    span: token.span.into(),
                },
                token.span,
            )),
        }
    }

    /// An identifier in primary position: a plain name, a constructor call
    /// (`Name(...)`, `Name[T](...)`), or an implicit-this call (`name(...)`).
    ///
    /// Class and built-in type names are capitalized in O; a call on a
    /// lowercase name is a method call on the current class.
    fn identifier_primary(&mut self, token: &Token) -> Result<Expr, ParseError> {
        let name = self.interner.intern(&token.lexeme);

        if self.check(TokenType::LBracket) {
            self.advance();
            let generic = self.type_ref()?;
            self.consume(TokenType::RBracket, "expected ']' after element type")?;
            self.consume(TokenType::LParen, "expected '(' after generic type")?;
            let args = self.arg_list_rest()?;
            let span = token.span.merge(self.previous.span);
            return Ok(Expr {
                id: self.next_id(),
                kind: ExprKind::ConstructorCall {
                    class: name,
                    generic: Some(generic),
                    args,
                },
                span,
            });
        }

        if self.check(TokenType::LParen) {
            let args = self.arg_list()?;
            let span = token.span.merge(self.previous.span);
            let capitalized = token.lexeme.chars().next().is_some_and(|c| c.is_uppercase());
            let kind = if capitalized {
                ExprKind::ConstructorCall {
                    class: name,
                    generic: None,
                    args,
                }
            } else {
                let callee = Expr {
                    id: self.next_id(),
                    kind: ExprKind::Identifier(name),
                    span: token.span,
                };
                ExprKind::Call {
                    callee: Box::new(callee),
                    args,
                }
            };
            return Ok(Expr {
                id: self.next_id(),
                kind,
                span,
            });
        }

        Ok(self.literal(ExprKind::Identifier(name), token.span))
    }

    fn arg_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.consume(TokenType::LParen, "expected '('")?;
        self.arg_list_rest()
    }

    /// Arguments after the opening parenthesis has been consumed.
    fn arg_list_rest(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RParen, "expected ')' after arguments")?;
        Ok(args)
    }

    // ===== Helpers =====

    fn literal(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr {
            id: self.next_id(),
            kind,
            span,
        }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn check(&self, ty: TokenType) -> bool {
        self.current.ty == ty
    }

    fn match_token(&mut self, ty: TokenType) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, ty: TokenType, message: &str) -> Result<(), ParseError> {
        if self.check(ty) {
            self.advance();
            return Ok(());
        }
        Err(ParseError::new(
            ParserError::UnexpectedToken {
                token: self.current.ty.as_str().to_string(),
                message: message.to_string(),
                span: self.current.span.into(),
            },
            self.current.span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Program, Interner) {
        let mut parser = Parser::new(source);
        let program = parser.parse_program().expect("parse failed");
        (program, parser.into_interner())
    }

    #[test]
    fn parses_class_with_base() {
        let (program, interner) = parse("class B extends A is end");
        assert_eq!(program.classes.len(), 1);
        let class = &program.classes[0];
        assert_eq!(interner.resolve(class.name), "B");
        assert_eq!(interner.resolve(class.base.unwrap()), "A");
        assert!(class.members.is_empty());
    }

    #[test]
    fn parses_field_method_and_ctor() {
        let (program, _) = parse(
            "class Main is
               var x : A()
               this(seed: Integer) is end
               method g : Integer => x.f()
             end",
        );
        let members = &program.classes[0].members;
        assert_eq!(members.len(), 3);
        assert!(matches!(members[0], Member::Field(_)));
        assert!(matches!(members[1], Member::Ctor(_)));
        assert!(matches!(members[2], Member::Method(_)));
    }

    #[test]
    fn forward_declaration_has_no_body() {
        let (program, _) = parse(
            "class C is
               method f : Integer
               method f : Integer is return Integer(0) end
             end",
        );
        let members = &program.classes[0].members;
        let Member::Method(fwd) = &members[0] else {
            panic!("expected method");
        };
        assert!(fwd.body.is_none());
        let Member::Method(implementation) = &members[1] else {
            panic!("expected method");
        };
        assert!(matches!(
            implementation.body,
            Some(MethodBody::Block(_))
        ));
    }

    #[test]
    fn capitalized_call_is_constructor_call() {
        let (program, interner) = parse("class Main is var x : Integer(1) end");
        let Member::Field(field) = &program.classes[0].members[0] else {
            panic!("expected field");
        };
        let ExprKind::ConstructorCall { class, generic, args } = &field.init.kind else {
            panic!("expected constructor call, got {:?}", field.init.kind);
        };
        assert_eq!(interner.resolve(*class), "Integer");
        assert!(generic.is_none());
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn lowercase_call_is_implicit_this_call() {
        let (program, _) = parse(
            "class Main is
               method g : Integer => f()
             end",
        );
        let Member::Method(method) = &program.classes[0].members[0] else {
            panic!("expected method");
        };
        let Some(MethodBody::Expr(expr)) = &method.body else {
            panic!("expected expression body");
        };
        let ExprKind::Call { callee, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(callee.kind, ExprKind::Identifier(_)));
    }

    #[test]
    fn generic_constructor_call() {
        let (program, interner) = parse("class Main is var a : Array[Integer](10) end");
        let Member::Field(field) = &program.classes[0].members[0] else {
            panic!("expected field");
        };
        let ExprKind::ConstructorCall { class, generic, args } = &field.init.kind else {
            panic!("expected constructor call");
        };
        assert_eq!(interner.resolve(*class), "Array");
        let TypeExprKind::Named(elem) = &generic.as_ref().unwrap().kind else {
            panic!("expected named element type");
        };
        assert_eq!(interner.resolve(*elem), "Integer");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn member_call_chain() {
        let (program, _) = parse(
            "class Main is
               method g : Integer => a.get(0).Plus(1)
             end",
        );
        let Member::Method(method) = &program.classes[0].members[0] else {
            panic!("expected method");
        };
        let Some(MethodBody::Expr(expr)) = &method.body else {
            panic!("expected expression body");
        };
        // Outermost node is the .Plus(...) call.
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(callee.kind, ExprKind::FieldAccess { .. }));
    }

    #[test]
    fn assignment_and_statements() {
        let (program, _) = parse(
            "class Main is
               method m(n: Integer) : Integer is
                 var total : Integer(0)
                 while n.Greater(Integer(0)) loop
                   total := total.Plus(n)
                   n := n.Minus(Integer(1))
                 end
                 if total.Greater(Integer(10)) then
                   return total
                 else
                   return Integer(0)
                 end
               end
             end",
        );
        let Member::Method(method) = &program.classes[0].members[0] else {
            panic!("expected method");
        };
        let Some(MethodBody::Block(block)) = &method.body else {
            panic!("expected block body");
        };
        assert_eq!(block.items.len(), 3);
        assert!(matches!(block.items[0].kind, StmtKind::Var { .. }));
        assert!(matches!(block.items[1].kind, StmtKind::While { .. }));
        assert!(matches!(block.items[2].kind, StmtKind::If { .. }));
    }

    #[test]
    fn return_without_value() {
        let (program, _) = parse(
            "class Main is
               method m is return end
             end",
        );
        let Member::Method(method) = &program.classes[0].members[0] else {
            panic!("expected method");
        };
        let Some(MethodBody::Block(block)) = &method.body else {
            panic!("expected block body");
        };
        assert!(matches!(block.items[0].kind, StmtKind::Return(None)));
    }

    #[test]
    fn this_field_assignment_target() {
        let (program, _) = parse(
            "class Counter is
               var count : Integer(0)
               this is this.count := Integer(1) end
             end",
        );
        let Member::Ctor(ctor) = &program.classes[0].members[1] else {
            panic!("expected constructor");
        };
        let StmtKind::Assign { target, .. } = &ctor.body.items[0].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(target.kind, ExprKind::FieldAccess { .. }));
    }

    #[test]
    fn node_ids_are_unique() {
        let (program, _) = parse("class Main is var x : Integer(1) var y : Integer(2) end");
        assert!(program.next_node_id > 0);
        let Member::Field(a) = &program.classes[0].members[0] else {
            panic!();
        };
        let Member::Field(b) = &program.classes[0].members[1] else {
            panic!();
        };
        assert_ne!(a.id, b.id);
        assert_ne!(a.init.id, b.init.id);
    }

    #[test]
    fn rejects_garbage_member() {
        let mut parser = Parser::new("class Main is return end");
        let err = parser.parse_program().unwrap_err();
        assert!(matches!(err.error, ParserError::ExpectedMember { .. }));
    }
}
