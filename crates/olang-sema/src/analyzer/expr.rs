// analyzer/expr.rs
//
// Expression checking. Every visited expression records its type into the
// expression-type map, including call callees, so the model is total over
// the surviving tree.

use super::{Analyzer, TypeError, types_compatible};
use crate::errors::SemanticError;
use crate::types::{SemanticType, TypeKind};
use olang_frontend::Symbol;
use olang_frontend::ast::*;
use smallvec::SmallVec;

/// Argument type lists are short in practice.
type ArgTypes = SmallVec<[SemanticType; 4]>;

impl Analyzer<'_> {
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> Result<SemanticType, TypeError> {
        let ty = self.check_expr_inner(expr)?;
        self.expr_types.insert(expr.id, ty.clone());
        Ok(ty)
    }

    fn check_expr_inner(&mut self, expr: &Expr) -> Result<SemanticType, TypeError> {
        match &expr.kind {
            ExprKind::IntLit(_) => Ok(SemanticType::integer()),
            ExprKind::RealLit(_) => Ok(SemanticType::real()),
            ExprKind::BoolLit(_) => Ok(SemanticType::boolean()),
            ExprKind::This => {
                let class = self
                    .current_class
                    .expect("expressions occur only inside classes");
                Ok(SemanticType::class(&self.registry.class(class).name))
            }
            ExprKind::Identifier(sym) => self.check_identifier(expr, *sym),
            ExprKind::ConstructorCall {
                class,
                generic,
                args,
            } => self.check_constructor_call(expr, *class, generic.as_ref(), args),
            ExprKind::Call { callee, args } => self.check_call(callee, args),
            ExprKind::FieldAccess { object, field } => {
                self.check_field_access(expr, object, *field)
            }
        }
    }

    /// Identifier as a value: a scoped variable or parameter, else a field
    /// of the current class (walking base links). Resolution marks the
    /// variable used.
    fn check_identifier(&mut self, expr: &Expr, sym: Symbol) -> Result<SemanticType, TypeError> {
        if let Some(var) = self.scope.get(sym) {
            self.registry.var_mut(var).is_used = true;
            return Ok(self.registry.var(var).ty.clone());
        }

        if let Some(class) = self.current_class {
            if let Some(var) = self.registry.find_field(class, sym) {
                self.registry.var_mut(var).is_used = true;
                return Ok(self.registry.var(var).ty.clone());
            }
        }

        Err(TypeError::new(
            SemanticError::UndeclaredIdentifier {
                name: self.interner.resolve(sym).to_string(),
                span: expr.span.into(),
            },
            expr.span,
        ))
    }

    fn check_constructor_call(
        &mut self,
        expr: &Expr,
        class_sym: Symbol,
        generic: Option<&TypeExpr>,
        args: &[Expr],
    ) -> Result<SemanticType, TypeError> {
        let name = self.interner.resolve(class_sym).to_string();
        match name.as_str() {
            "Array" => {
                let Some(generic) = generic else {
                    return Err(TypeError::new(
                        SemanticError::UnknownClass {
                            name,
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                };
                let element = self.resolve_type(generic)?;
                if args.len() != 1 {
                    return Err(TypeError::new(
                        SemanticError::ArgumentCountMismatch {
                            expected: 1,
                            found: args.len(),
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                }
                let len_ty = self.check_expr(&args[0])?;
                self.expect_type(&SemanticType::integer(), &len_ty, &args[0])?;
                Ok(SemanticType::array_of(&element))
            }
            "List" => {
                let Some(generic) = generic else {
                    return Err(TypeError::new(
                        SemanticError::UnknownClass {
                            name,
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                };
                let element = self.resolve_type(generic)?;
                match args {
                    [] => {}
                    [value] => {
                        let ty = self.check_expr(value)?;
                        self.expect_type(&element, &ty, value)?;
                    }
                    [value, count] => {
                        let ty = self.check_expr(value)?;
                        self.expect_type(&element, &ty, value)?;
                        let count_ty = self.check_expr(count)?;
                        self.expect_type(&SemanticType::integer(), &count_ty, count)?;
                    }
                    _ => {
                        return Err(TypeError::new(
                            SemanticError::ArgumentCountMismatch {
                                expected: 2,
                                found: args.len(),
                                span: expr.span.into(),
                            },
                            expr.span,
                        ));
                    }
                }
                Ok(SemanticType::list_of(&element))
            }
            // Built-in literal constructors: the arguments are typed but
            // otherwise unchecked; the backend folds or converts them.
            "Integer" | "Real" | "Boolean" => {
                for arg in args {
                    self.check_expr(arg)?;
                }
                Ok(match name.as_str() {
                    "Integer" => SemanticType::integer(),
                    "Real" => SemanticType::real(),
                    _ => SemanticType::boolean(),
                })
            }
            _ => {
                let Some(class_id) = self.registry.lookup_class(&name) else {
                    return Err(TypeError::new(
                        SemanticError::UnknownClass {
                            name,
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                };

                let mut arg_types = ArgTypes::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.check_expr(arg)?);
                }

                let ctors = self.registry.class(class_id).ctors.clone();
                if ctors.is_empty() {
                    // Without declared constructors only `C()` is valid.
                    if !args.is_empty() {
                        return Err(TypeError::new(
                            SemanticError::NoMatchingOverload {
                                name,
                                span: expr.span.into(),
                            },
                            expr.span,
                        ));
                    }
                } else {
                    let selected = self.select_ctor(&ctors, &arg_types, &name, expr.span)?;
                    let params = self.registry.ctor(selected).params.clone();
                    self.ensure_arguments_compatible(&params, &arg_types, args, expr.span)?;
                }
                Ok(SemanticType::class(&name))
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<SemanticType, TypeError> {
        let result = match &callee.kind {
            // Unqualified call: a method of the current class, including
            // inherited ones.
            ExprKind::Identifier(method) => {
                let class = self
                    .current_class
                    .expect("expressions occur only inside classes");
                let mut arg_types = ArgTypes::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.check_expr(arg)?);
                }

                let Some(set) = self.registry.find_overloads(class, *method).map(<[_]>::to_vec)
                else {
                    return Err(TypeError::new(
                        SemanticError::MethodNotDeclared {
                            name: self.interner.resolve(*method).to_string(),
                            receiver: self.registry.class(class).name.clone(),
                            span: callee.span.into(),
                        },
                        callee.span,
                    ));
                };

                let name = self.interner.resolve(*method).to_string();
                let selected = self.select_method(&set, &arg_types, &name, callee.span)?;
                let params = self.registry.method(selected).params.clone();
                self.ensure_arguments_compatible(&params, &arg_types, args, callee.span)?;
                self.registry.method(selected).return_type.clone()
            }
            ExprKind::FieldAccess { object, field } => {
                let receiver = self.check_expr(object)?;
                self.check_member_call(callee, &receiver, *field, args)?
            }
            // The parser only builds calls on identifiers and member
            // accesses.
            _ => unreachable!("call callee is an identifier or member access"),
        };

        // The callee wrapper node carries the call's result type so that
        // the model covers every surviving expression node.
        self.expr_types.insert(callee.id, result.clone());
        Ok(result)
    }

    fn check_member_call(
        &mut self,
        callee: &Expr,
        receiver: &SemanticType,
        method: Symbol,
        args: &[Expr],
    ) -> Result<SemanticType, TypeError> {
        let method_name = self.interner.resolve(method).to_string();
        match receiver.kind {
            TypeKind::Integer | TypeKind::Real | TypeKind::Boolean => {
                if method_name == "Print" && args.is_empty() {
                    return Ok(receiver.clone());
                }
                // The remaining primitive vocabulary is a backend concern;
                // its result participates in checking as the wildcard.
                for arg in args {
                    self.check_expr(arg)?;
                }
                Ok(SemanticType::standard("Standard"))
            }
            TypeKind::Array => self.check_array_builtin(callee, receiver, &method_name, args),
            TypeKind::List => self.check_list_builtin(callee, receiver, &method_name, args),
            TypeKind::Class => {
                let Some(class_id) = self.registry.lookup_class(&receiver.name) else {
                    return Err(TypeError::new(
                        SemanticError::TypeNotDeclared {
                            name: receiver.name.clone(),
                            span: callee.span.into(),
                        },
                        callee.span,
                    ));
                };

                let mut arg_types = ArgTypes::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.check_expr(arg)?);
                }

                let Some(set) = self.registry.find_overloads(class_id, method).map(<[_]>::to_vec)
                else {
                    return Err(TypeError::new(
                        SemanticError::MethodNotDeclared {
                            name: method_name,
                            receiver: receiver.name.clone(),
                            span: callee.span.into(),
                        },
                        callee.span,
                    ));
                };

                let selected = self.select_method(&set, &arg_types, &method_name, callee.span)?;
                let params = self.registry.method(selected).params.clone();
                self.ensure_arguments_compatible(&params, &arg_types, args, callee.span)?;
                Ok(self.registry.method(selected).return_type.clone())
            }
            TypeKind::Standard | TypeKind::Unknown => {
                for arg in args {
                    self.check_expr(arg)?;
                }
                Ok(if receiver.kind == TypeKind::Unknown {
                    SemanticType::unknown()
                } else {
                    SemanticType::standard("Standard")
                })
            }
            TypeKind::Void => Err(TypeError::new(
                SemanticError::MethodNotDeclared {
                    name: method_name,
                    receiver: receiver.name.clone(),
                    span: callee.span.into(),
                },
                callee.span,
            )),
        }
    }

    fn check_array_builtin(
        &mut self,
        callee: &Expr,
        receiver: &SemanticType,
        method: &str,
        args: &[Expr],
    ) -> Result<SemanticType, TypeError> {
        let element = receiver.element().unwrap_or_else(SemanticType::unknown);
        match method {
            "Length" => {
                self.expect_arg_count(0, args, callee)?;
                Ok(SemanticType::integer())
            }
            "get" => {
                self.expect_arg_count(1, args, callee)?;
                let index = self.check_expr(&args[0])?;
                self.expect_type(&SemanticType::integer(), &index, &args[0])?;
                Ok(element)
            }
            "set" => {
                self.expect_arg_count(2, args, callee)?;
                let index = self.check_expr(&args[0])?;
                self.expect_type(&SemanticType::integer(), &index, &args[0])?;
                let value = self.check_expr(&args[1])?;
                self.expect_type(&element, &value, &args[1])?;
                Ok(receiver.clone())
            }
            _ => Err(TypeError::new(
                SemanticError::MethodNotDeclared {
                    name: method.to_string(),
                    receiver: receiver.name.clone(),
                    span: callee.span.into(),
                },
                callee.span,
            )),
        }
    }

    fn check_list_builtin(
        &mut self,
        callee: &Expr,
        receiver: &SemanticType,
        method: &str,
        args: &[Expr],
    ) -> Result<SemanticType, TypeError> {
        let element = receiver.element().unwrap_or_else(SemanticType::unknown);
        match method {
            "append" => {
                self.expect_arg_count(1, args, callee)?;
                let value = self.check_expr(&args[0])?;
                self.expect_type(&element, &value, &args[0])?;
                Ok(receiver.clone())
            }
            "head" => {
                self.expect_arg_count(0, args, callee)?;
                Ok(element)
            }
            "tail" => {
                self.expect_arg_count(0, args, callee)?;
                Ok(receiver.clone())
            }
            "toArray" => {
                self.expect_arg_count(0, args, callee)?;
                Ok(SemanticType::array_of(&element))
            }
            _ => Err(TypeError::new(
                SemanticError::MethodNotDeclared {
                    name: method.to_string(),
                    receiver: receiver.name.clone(),
                    span: callee.span.into(),
                },
                callee.span,
            )),
        }
    }

    /// Member access in value position: a field read on a class instance.
    fn check_field_access(
        &mut self,
        expr: &Expr,
        object: &Expr,
        field: Symbol,
    ) -> Result<SemanticType, TypeError> {
        let object_ty = self.check_expr(object)?;
        match object_ty.kind {
            TypeKind::Class => {
                let Some(class_id) = self.registry.lookup_class(&object_ty.name) else {
                    return Err(TypeError::new(
                        SemanticError::TypeNotDeclared {
                            name: object_ty.name.clone(),
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                };
                let Some(var) = self.registry.find_field(class_id, field) else {
                    return Err(TypeError::new(
                        SemanticError::UndeclaredIdentifier {
                            name: self.interner.resolve(field).to_string(),
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                };
                self.registry.var_mut(var).is_used = true;
                Ok(self.registry.var(var).ty.clone())
            }
            TypeKind::Unknown => Ok(SemanticType::unknown()),
            TypeKind::Integer
            | TypeKind::Real
            | TypeKind::Boolean
            | TypeKind::Array
            | TypeKind::List
            | TypeKind::Standard => Ok(SemanticType::standard("Standard")),
            TypeKind::Void => Err(TypeError::new(
                SemanticError::TypeNotDeclared {
                    name: object_ty.name.clone(),
                    span: expr.span.into(),
                },
                expr.span,
            )),
        }
    }

    // ===== Small shared checks =====

    pub(super) fn expect_arg_count(
        &self,
        expected: usize,
        args: &[Expr],
        at: &Expr,
    ) -> Result<(), TypeError> {
        if args.len() != expected {
            return Err(TypeError::new(
                SemanticError::ArgumentCountMismatch {
                    expected,
                    found: args.len(),
                    span: at.span.into(),
                },
                at.span,
            ));
        }
        Ok(())
    }

    pub(super) fn expect_type(
        &self,
        expected: &SemanticType,
        found: &SemanticType,
        at: &Expr,
    ) -> Result<(), TypeError> {
        if !types_compatible(expected, found) {
            return Err(TypeError::new(
                SemanticError::TypeMismatch {
                    expected: expected.name.clone(),
                    found: found.name.clone(),
                    span: at.span.into(),
                },
                at.span,
            ));
        }
        Ok(())
    }
}
