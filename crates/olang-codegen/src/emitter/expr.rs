// emitter/expr.rs
//
// Expression lowering. Every non-void expression lowers to a
// (register, llvm type, semantic type) triple; loads happen exactly once
// per evaluation.

use super::{Emitter, Value};
use crate::context::FuncCtx;
use crate::names::{format_real, llvm_type, mangle_ctor, sanitize};
use olang_frontend::Symbol;
use olang_frontend::ast::*;
use olang_sema::{SemanticType, TypeKind};

impl Emitter<'_> {
    pub(crate) fn lower_expr(&mut self, ctx: &mut FuncCtx, expr: &Expr) -> Value {
        match &expr.kind {
            ExprKind::IntLit(v) => Value::new(v.to_string(), "i32", SemanticType::integer()),
            ExprKind::RealLit(v) => Value::new(format_real(*v), "double", SemanticType::real()),
            ExprKind::BoolLit(b) => Value::new(
                if *b { "1" } else { "0" },
                "i1",
                SemanticType::boolean(),
            ),
            ExprKind::This => {
                let class = ctx.class.clone();
                Value::new(
                    "%this",
                    format!("%{}*", sanitize(&class)),
                    SemanticType::class(&class),
                )
            }
            ExprKind::Identifier(sym) => self.lower_identifier(ctx, expr, *sym),
            ExprKind::ConstructorCall {
                class,
                generic: _,
                args,
            } => self.lower_constructor_call(ctx, expr, *class, args),
            ExprKind::Call { callee, args } => self.lower_call(ctx, expr, callee, args),
            ExprKind::FieldAccess { object, field } => {
                self.lower_field_load(ctx, expr, object, *field)
            }
        }
    }

    /// Identifier read: a stack slot when scoped, else a field of `%this`.
    fn lower_identifier(&mut self, ctx: &mut FuncCtx, expr: &Expr, sym: Symbol) -> Value {
        if let Some(slot) = ctx.lookup(sym).cloned() {
            let value = ctx.temp();
            self.line(
                ctx,
                &format!("{value} = load {0}, {0}* {1}", slot.llvm_ty, slot.reg),
            );
            return Value::new(value, slot.llvm_ty, slot.ty);
        }

        let class = ctx.class.clone();
        let name = self.interner.resolve(sym).to_string();
        if let Some(slot) = self.field_slot(&class, &name) {
            let ptr = self.field_ptr(ctx, "%this", &class, &slot);
            let lty = llvm_type(&slot.ty);
            let value = ctx.temp();
            self.line(ctx, &format!("{value} = load {lty}, {lty}* {ptr}"));
            return Value::new(value, lty, slot.ty);
        }

        self.comment(ctx, &format!("unresolved identifier {name}"));
        self.default_of_expr(expr)
    }

    fn lower_constructor_call(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        class: Symbol,
        args: &[Expr],
    ) -> Value {
        let name = self.interner.resolve(class).to_string();
        match name.as_str() {
            // Built-in constructors fold to their argument (or to the
            // type's zero without one).
            "Integer" => self.lower_builtin_ctor(ctx, args, "i32", SemanticType::integer()),
            "Real" => self.lower_builtin_ctor(ctx, args, "double", SemanticType::real()),
            "Boolean" => self.lower_builtin_ctor(ctx, args, "i1", SemanticType::boolean()),
            "Array" => {
                let ty = self
                    .model
                    .expr_type(expr.id)
                    .cloned()
                    .unwrap_or_else(|| SemanticType::standard("Array"));
                let length = match args.first() {
                    Some(arg) => {
                        let v = self.lower_expr(ctx, arg);
                        self.coerce(ctx, v, "i32").repr
                    }
                    None => "0".to_string(),
                };
                let value = ctx.temp();
                self.line(
                    ctx,
                    &format!("{value} = call %Array* @o_array_new(i32 {length})"),
                );
                Value::new(value, "%Array*", ty)
            }
            "List" => self.lower_list_ctor(ctx, expr, args),
            _ => {
                let object = self.emit_allocation(ctx, &name);
                self.emit_ctor_call(ctx, &name, &object, args);
                object
            }
        }
    }

    fn lower_builtin_ctor(
        &mut self,
        ctx: &mut FuncCtx,
        args: &[Expr],
        llvm_ty: &str,
        ty: SemanticType,
    ) -> Value {
        let Some(first) = args.first() else {
            return Value::new(crate::names::default_value(llvm_ty), llvm_ty, ty);
        };
        let value = self.lower_expr(ctx, first);
        let value = self.coerce(ctx, value, llvm_ty);
        Value::new(value.repr, llvm_ty, ty)
    }

    fn lower_list_ctor(&mut self, ctx: &mut FuncCtx, expr: &Expr, args: &[Expr]) -> Value {
        let ty = self
            .model
            .expr_type(expr.id)
            .cloned()
            .unwrap_or_else(|| SemanticType::standard("List"));
        let value = ctx.temp();
        match args {
            [] => self.line(ctx, &format!("{value} = call %List* @o_list_empty()")),
            [element] => {
                let v = self.lower_expr(ctx, element);
                let boxed = self.box_value(ctx, &v);
                self.line(
                    ctx,
                    &format!("{value} = call %List* @o_list_singleton(i8* {boxed})"),
                );
            }
            [element, count, ..] => {
                let v = self.lower_expr(ctx, element);
                let boxed = self.box_value(ctx, &v);
                let n = self.lower_expr(ctx, count);
                let n = self.coerce(ctx, n, "i32");
                self.line(
                    ctx,
                    &format!(
                        "{value} = call %List* @o_list_replicate(i8* {boxed}, i32 {})",
                        n.repr
                    ),
                );
            }
        }
        Value::new(value, "%List*", ty)
    }

    /// Select and call the user constructor matching the argument types.
    fn emit_ctor_call(&mut self, ctx: &mut FuncCtx, class: &str, object: &Value, args: &[Expr]) {
        let values: Vec<Value> = args.iter().map(|a| self.lower_expr(ctx, a)).collect();
        let ctors = match self.model.class(class) {
            Some(c) => c.ctors.clone(),
            None => Vec::new(),
        };

        let selected = ctors.iter().find(|ctor| {
            ctor.param_types.len() == values.len()
                && ctor
                    .param_types
                    .iter()
                    .zip(&values)
                    .all(|(p, v)| p.is_compatible_with(&v.ty))
        });

        match selected {
            Some(ctor) => {
                let mut call_args = format!("%{}* {}", sanitize(class), object.repr);
                for (param, value) in ctor.param_types.iter().zip(values) {
                    let lty = llvm_type(param);
                    let coerced = self.coerce(ctx, value, &lty);
                    call_args.push_str(&format!(", {lty} {}", coerced.repr));
                }
                let mangled = mangle_ctor(class, &ctor.param_types);
                self.line(ctx, &format!("call void @{mangled}({call_args})"));
            }
            None if ctors.is_empty() && args.is_empty() => {}
            None => self.comment(ctx, &format!("no matching constructor for {class}")),
        }
    }

    fn lower_call(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        callee: &Expr,
        args: &[Expr],
    ) -> Value {
        match &callee.kind {
            // Unqualified call: dispatch on `%this` with the current class
            // as the static receiver.
            ExprKind::Identifier(method) => {
                let class = ctx.class.clone();
                let receiver = Value::new(
                    "%this",
                    format!("%{}*", sanitize(&class)),
                    SemanticType::class(&class),
                );
                let method = self.interner.resolve(*method).to_string();
                self.lower_dispatch(ctx, expr, receiver, &class, &method, args)
            }
            ExprKind::FieldAccess { object, field } => {
                let receiver = self.lower_expr(ctx, object);
                let method = self.interner.resolve(*field).to_string();
                match receiver.ty.kind {
                    TypeKind::Integer | TypeKind::Real | TypeKind::Boolean => {
                        self.lower_primitive_call(ctx, expr, receiver, &method, args)
                    }
                    TypeKind::Array => self.lower_array_call(ctx, expr, receiver, &method, args),
                    TypeKind::List => self.lower_list_call(ctx, expr, receiver, &method, args),
                    TypeKind::Class => {
                        let class = receiver.ty.name.clone();
                        self.lower_dispatch(ctx, expr, receiver, &class, &method, args)
                    }
                    _ => {
                        self.comment(
                            ctx,
                            &format!("call of {method} on untyped receiver"),
                        );
                        self.default_of_expr(expr)
                    }
                }
            }
            _ => {
                self.comment(ctx, "unsupported call target");
                self.default_of_expr(expr)
            }
        }
    }

    /// Member access in value position: a field load through the object
    /// pointer.
    fn lower_field_load(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        object: &Expr,
        field: Symbol,
    ) -> Value {
        let base = self.lower_expr(ctx, object);
        let name = self.interner.resolve(field).to_string();

        if base.ty.kind != TypeKind::Class {
            self.comment(ctx, &format!("field {name} on non-class value"));
            return self.default_of_expr(expr);
        }

        let class = base.ty.name.clone();
        let Some(slot) = self.field_slot(&class, &name) else {
            self.comment(ctx, &format!("unknown field {class}.{name}"));
            return self.default_of_expr(expr);
        };
        let ptr = self.field_ptr(ctx, &base.repr, &class, &slot);
        let lty = llvm_type(&slot.ty);
        let value = ctx.temp();
        self.line(ctx, &format!("{value} = load {lty}, {lty}* {ptr}"));
        Value::new(value, lty, slot.ty)
    }
}
