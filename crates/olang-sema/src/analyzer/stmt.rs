// analyzer/stmt.rs
//
// Statement checking. Loop and branch bodies run in fresh child scopes
// and are cleaned up as soon as their analysis finishes.

use super::{Analyzer, TypeError, types_compatible};
use crate::errors::SemanticError;
use crate::registry::{VarDef, VarKind};
use crate::types::SemanticType;
use olang_frontend::ast::*;
use olang_frontend::{Span, Symbol};

impl Analyzer<'_> {
    pub(crate) fn check_block(&mut self, block: &mut Block) -> Result<(), TypeError> {
        for stmt in block.items.iter_mut() {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<(), TypeError> {
        let (id, span) = (stmt.id, stmt.span);
        match &mut stmt.kind {
            StmtKind::Var { name, init } => self.check_var_decl(id, *name, init, span),
            StmtKind::Assign { target, value } => self.check_assign(target, value),
            StmtKind::While { cond, body } => {
                let cond_ty = self.check_expr(cond)?;
                self.expect_boolean(&cond_ty, cond)?;
                self.push_scope();
                let result = self.check_block(body);
                if result.is_ok() {
                    self.cleanup_body(body);
                }
                self.pop_scope();
                result
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond_ty = self.check_expr(cond)?;
                self.expect_boolean(&cond_ty, cond)?;

                self.push_scope();
                let result = self.check_block(then_body);
                if result.is_ok() {
                    self.cleanup_body(then_body);
                }
                self.pop_scope();
                result?;

                if let Some(else_body) = else_body {
                    self.push_scope();
                    let result = self.check_block(else_body);
                    if result.is_ok() {
                        self.cleanup_body(else_body);
                    }
                    self.pop_scope();
                    result?;
                }
                Ok(())
            }
            StmtKind::Return(value) => self.check_return(value.as_ref(), span),
            StmtKind::Expr(expr) => {
                self.check_expr(expr)?;
                Ok(())
            }
        }
    }

    fn check_var_decl(
        &mut self,
        node: NodeId,
        name: Symbol,
        init: &Expr,
        span: Span,
    ) -> Result<(), TypeError> {
        // Shadowing through child scopes is allowed; a twin in the same
        // scope is not.
        if self.scope.get_local(name).is_some() {
            return Err(TypeError::new(
                SemanticError::DuplicateVariable {
                    name: self.interner.resolve(name).to_string(),
                    span: span.into(),
                },
                span,
            ));
        }

        let ty = self.check_expr(init)?;
        if ty.is_void() {
            return Err(TypeError::new(
                SemanticError::VoidInitializer {
                    name: self.interner.resolve(name).to_string(),
                    span: span.into(),
                },
                span,
            ));
        }

        let var = self.registry.add_var(VarDef {
            name,
            ty: ty.clone(),
            kind: VarKind::Local,
            node,
            is_used: false,
        });
        self.var_types.insert(node, ty);
        self.var_of_node.insert(node, var);
        self.scope.define(name, var);
        Ok(())
    }

    fn check_assign(&mut self, target: &Expr, value: &Expr) -> Result<(), TypeError> {
        if !matches!(
            target.kind,
            ExprKind::Identifier(_) | ExprKind::FieldAccess { .. }
        ) {
            return Err(TypeError::new(
                SemanticError::UnsupportedExpressionTarget {
                    span: target.span.into(),
                },
                target.span,
            ));
        }

        let target_ty = self.check_expr(target)?;
        let value_ty = self.check_expr(value)?;

        if target_ty.is_void() {
            return Err(TypeError::new(
                SemanticError::VoidAssignmentTarget {
                    span: target.span.into(),
                },
                target.span,
            ));
        }
        if !types_compatible(&target_ty, &value_ty) {
            return Err(TypeError::new(
                SemanticError::TypeMismatch {
                    expected: target_ty.name,
                    found: value_ty.name,
                    span: value.span.into(),
                },
                value.span,
            ));
        }
        Ok(())
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span) -> Result<(), TypeError> {
        let Some(declared) = self.current_return.clone() else {
            return Err(TypeError::new(
                SemanticError::ReturnOutsideMethod { span: span.into() },
                span,
            ));
        };

        if declared.is_void() {
            if value.is_some() {
                return Err(TypeError::new(
                    SemanticError::ReturnValueInVoid { span: span.into() },
                    span,
                ));
            }
            return Ok(());
        }

        let Some(value) = value else {
            return Err(TypeError::new(
                SemanticError::MissingReturnValue {
                    expected: declared.name,
                    span: span.into(),
                },
                span,
            ));
        };
        let ty = self.check_expr(value)?;
        if !types_compatible(&ty, &declared) {
            return Err(TypeError::new(
                SemanticError::TypeMismatch {
                    expected: declared.name,
                    found: ty.name,
                    span: value.span.into(),
                },
                value.span,
            ));
        }
        Ok(())
    }

    fn expect_boolean(&self, cond_ty: &SemanticType, cond: &Expr) -> Result<(), TypeError> {
        if !types_compatible(cond_ty, &SemanticType::boolean()) {
            return Err(TypeError::new(
                SemanticError::TypeMismatch {
                    expected: "Boolean".to_string(),
                    found: cond_ty.name.clone(),
                    span: cond.span.into(),
                },
                cond.span,
            ));
        }
        Ok(())
    }
}
