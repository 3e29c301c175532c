// emitter/intrinsics.rs
//
// The fixed primitive method vocabulary, the Array/List runtime built-ins,
// and primitive boxing for the runtime's generic `i8*` cells.

use super::{Emitter, Value};
use crate::context::FuncCtx;
use crate::names::llvm_type;
use crate::runtime::boxed_size;
use olang_frontend::ast::Expr;
use olang_sema::{SemanticType, TypeKind};

impl Emitter<'_> {
    /// Lower a call on an Integer/Real/Boolean receiver through the fixed
    /// instruction table.
    pub(super) fn lower_primitive_call(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        receiver: Value,
        method: &str,
        args: &[Expr],
    ) -> Value {
        match receiver.ty.kind {
            TypeKind::Integer => match method {
                "Plus" => self.int_binop(ctx, "add", receiver, args, expr),
                "Minus" => self.int_binop(ctx, "sub", receiver, args, expr),
                "Mult" => self.int_binop(ctx, "mul", receiver, args, expr),
                "Div" => self.int_binop(ctx, "sdiv", receiver, args, expr),
                "Rem" => self.int_binop(ctx, "srem", receiver, args, expr),
                "Less" => self.int_cmp(ctx, "slt", receiver, args, expr),
                "Greater" => self.int_cmp(ctx, "sgt", receiver, args, expr),
                "Equal" => self.int_cmp(ctx, "eq", receiver, args, expr),
                "toReal" => {
                    let t = ctx.temp();
                    self.line(ctx, &format!("{t} = sitofp i32 {} to double", receiver.repr));
                    Value::new(t, "double", SemanticType::real())
                }
                "toBoolean" => {
                    let t = ctx.temp();
                    self.line(ctx, &format!("{t} = icmp ne i32 {}, 0", receiver.repr));
                    Value::new(t, "i1", SemanticType::boolean())
                }
                "Print" => {
                    self.print_value(ctx, &receiver.repr, "@.fmt_int", "i32");
                    receiver
                }
                _ => self.unknown_primitive(ctx, expr, &receiver, method),
            },
            TypeKind::Real => match method {
                "Plus" => self.real_binop(ctx, "fadd", receiver, args, expr),
                "Minus" => self.real_binop(ctx, "fsub", receiver, args, expr),
                "Mult" => self.real_binop(ctx, "fmul", receiver, args, expr),
                "Div" => self.real_binop(ctx, "fdiv", receiver, args, expr),
                "Less" => self.real_cmp(ctx, "olt", receiver, args, expr),
                "Greater" => self.real_cmp(ctx, "ogt", receiver, args, expr),
                "Equal" => self.real_cmp(ctx, "oeq", receiver, args, expr),
                "toInteger" => {
                    let t = ctx.temp();
                    self.line(ctx, &format!("{t} = fptosi double {} to i32", receiver.repr));
                    Value::new(t, "i32", SemanticType::integer())
                }
                "Print" => {
                    self.print_value(ctx, &receiver.repr, "@.fmt_real", "double");
                    receiver
                }
                _ => self.unknown_primitive(ctx, expr, &receiver, method),
            },
            TypeKind::Boolean => match method {
                "And" => self.bool_binop(ctx, "and", receiver, args, expr),
                "Or" => self.bool_binop(ctx, "or", receiver, args, expr),
                "Xor" => self.bool_binop(ctx, "xor", receiver, args, expr),
                "Not" => {
                    let t = ctx.temp();
                    self.line(ctx, &format!("{t} = xor i1 {}, 1", receiver.repr));
                    Value::new(t, "i1", SemanticType::boolean())
                }
                "toInteger" => {
                    let t = ctx.temp();
                    self.line(ctx, &format!("{t} = zext i1 {} to i32", receiver.repr));
                    Value::new(t, "i32", SemanticType::integer())
                }
                "Print" => {
                    let wide = ctx.temp();
                    self.line(ctx, &format!("{wide} = zext i1 {} to i32", receiver.repr));
                    self.print_value(ctx, &wide, "@.fmt_int", "i32");
                    receiver
                }
                _ => self.unknown_primitive(ctx, expr, &receiver, method),
            },
            _ => unreachable!("primitive receiver"),
        }
    }

    fn int_binop(
        &mut self,
        ctx: &mut FuncCtx,
        op: &str,
        receiver: Value,
        args: &[Expr],
        expr: &Expr,
    ) -> Value {
        let Some(rhs) = self.binop_arg(ctx, args, "i32") else {
            return self.missing_operand(ctx, expr);
        };
        let t = ctx.temp();
        self.line(ctx, &format!("{t} = {op} i32 {}, {rhs}", receiver.repr));
        Value::new(t, "i32", SemanticType::integer())
    }

    fn int_cmp(
        &mut self,
        ctx: &mut FuncCtx,
        cond: &str,
        receiver: Value,
        args: &[Expr],
        expr: &Expr,
    ) -> Value {
        let Some(rhs) = self.binop_arg(ctx, args, "i32") else {
            return self.missing_operand(ctx, expr);
        };
        let t = ctx.temp();
        self.line(ctx, &format!("{t} = icmp {cond} i32 {}, {rhs}", receiver.repr));
        Value::new(t, "i1", SemanticType::boolean())
    }

    fn real_binop(
        &mut self,
        ctx: &mut FuncCtx,
        op: &str,
        receiver: Value,
        args: &[Expr],
        expr: &Expr,
    ) -> Value {
        let Some(rhs) = self.binop_arg(ctx, args, "double") else {
            return self.missing_operand(ctx, expr);
        };
        let t = ctx.temp();
        self.line(ctx, &format!("{t} = {op} double {}, {rhs}", receiver.repr));
        Value::new(t, "double", SemanticType::real())
    }

    fn real_cmp(
        &mut self,
        ctx: &mut FuncCtx,
        cond: &str,
        receiver: Value,
        args: &[Expr],
        expr: &Expr,
    ) -> Value {
        let Some(rhs) = self.binop_arg(ctx, args, "double") else {
            return self.missing_operand(ctx, expr);
        };
        let t = ctx.temp();
        self.line(ctx, &format!("{t} = fcmp {cond} double {}, {rhs}", receiver.repr));
        Value::new(t, "i1", SemanticType::boolean())
    }

    fn bool_binop(
        &mut self,
        ctx: &mut FuncCtx,
        op: &str,
        receiver: Value,
        args: &[Expr],
        expr: &Expr,
    ) -> Value {
        let Some(rhs) = self.binop_arg(ctx, args, "i1") else {
            return self.missing_operand(ctx, expr);
        };
        let t = ctx.temp();
        self.line(ctx, &format!("{t} = {op} i1 {}, {rhs}", receiver.repr));
        Value::new(t, "i1", SemanticType::boolean())
    }

    /// The single right-hand operand of a primitive binary method,
    /// converted to the receiver's LLVM type.
    fn binop_arg(&mut self, ctx: &mut FuncCtx, args: &[Expr], target: &str) -> Option<String> {
        let arg = args.first()?;
        let value = self.lower_expr(ctx, arg);
        Some(self.coerce(ctx, value, target).repr)
    }

    fn missing_operand(&mut self, ctx: &mut FuncCtx, expr: &Expr) -> Value {
        self.comment(ctx, "missing operand");
        self.default_of_expr(expr)
    }

    fn unknown_primitive(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        receiver: &Value,
        method: &str,
    ) -> Value {
        self.comment(
            ctx,
            &format!("no built-in {method} on {}", receiver.ty.name),
        );
        self.default_of_expr(expr)
    }

    /// `printf` through one of the two format-string globals. Print calls
    /// yield their receiver, so callers return it unchanged.
    fn print_value(&mut self, ctx: &mut FuncCtx, repr: &str, fmt: &str, lty: &str) {
        let fmt_ptr = ctx.temp();
        self.line(
            ctx,
            &format!("{fmt_ptr} = getelementptr [4 x i8], [4 x i8]* {fmt}, i32 0, i32 0"),
        );
        let ret = ctx.temp();
        self.line(
            ctx,
            &format!("{ret} = call i32 (i8*, ...) @printf(i8* {fmt_ptr}, {lty} {repr})"),
        );
    }

    // ===== Array / List built-ins =====

    pub(super) fn lower_array_call(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        receiver: Value,
        method: &str,
        args: &[Expr],
    ) -> Value {
        let element = receiver
            .ty
            .element()
            .unwrap_or_else(SemanticType::unknown);
        match method {
            "Length" => {
                let t = ctx.temp();
                self.line(
                    ctx,
                    &format!("{t} = call i32 @o_array_length(%Array* {})", receiver.repr),
                );
                Value::new(t, "i32", SemanticType::integer())
            }
            "get" => {
                let Some(index) = self.binop_arg(ctx, args, "i32") else {
                    return self.missing_operand(ctx, expr);
                };
                let cell = ctx.temp();
                self.line(
                    ctx,
                    &format!(
                        "{cell} = call i8* @o_array_get(%Array* {}, i32 {index})",
                        receiver.repr
                    ),
                );
                self.unbox_value(ctx, cell, &element)
            }
            "set" => {
                if args.len() != 2 {
                    return self.missing_operand(ctx, expr);
                }
                let index = self.lower_expr(ctx, &args[0]);
                let index = self.coerce(ctx, index, "i32");
                let value = self.lower_expr(ctx, &args[1]);
                let boxed = self.box_value(ctx, &value);
                self.line(
                    ctx,
                    &format!(
                        "call void @o_array_set(%Array* {}, i32 {}, i8* {boxed})",
                        receiver.repr, index.repr
                    ),
                );
                receiver
            }
            _ => self.unknown_primitive(ctx, expr, &receiver, method),
        }
    }

    pub(super) fn lower_list_call(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        receiver: Value,
        method: &str,
        args: &[Expr],
    ) -> Value {
        let element = receiver
            .ty
            .element()
            .unwrap_or_else(SemanticType::unknown);
        match method {
            "append" => {
                let Some(arg) = args.first() else {
                    return self.missing_operand(ctx, expr);
                };
                let value = self.lower_expr(ctx, arg);
                let boxed = self.box_value(ctx, &value);
                let t = ctx.temp();
                self.line(
                    ctx,
                    &format!(
                        "{t} = call %List* @o_list_append(%List* {}, i8* {boxed})",
                        receiver.repr
                    ),
                );
                Value::new(t, "%List*", receiver.ty)
            }
            "head" => {
                let cell = ctx.temp();
                self.line(
                    ctx,
                    &format!("{cell} = call i8* @o_list_head(%List* {})", receiver.repr),
                );
                self.unbox_value(ctx, cell, &element)
            }
            "tail" => {
                let t = ctx.temp();
                self.line(
                    ctx,
                    &format!("{t} = call %List* @o_list_tail(%List* {})", receiver.repr),
                );
                Value::new(t, "%List*", receiver.ty)
            }
            "toArray" => {
                let t = ctx.temp();
                self.line(
                    ctx,
                    &format!(
                        "{t} = call %Array* @o_list_to_array(%List* {})",
                        receiver.repr
                    ),
                );
                Value::new(t, "%Array*", SemanticType::array_of(&element))
            }
            _ => self.unknown_primitive(ctx, expr, &receiver, method),
        }
    }

    // ===== Boxing =====

    /// Box a value into the runtime's generic `i8*` cell: primitives copy
    /// into a fresh allocation, references bitcast in place.
    pub(super) fn box_value(&mut self, ctx: &mut FuncCtx, value: &Value) -> String {
        if let Some(size) = boxed_size(&value.llvm_ty) {
            let raw = ctx.temp();
            self.line(ctx, &format!("{raw} = call i8* @malloc(i64 {size})"));
            let typed = ctx.temp();
            self.line(
                ctx,
                &format!("{typed} = bitcast i8* {raw} to {}*", value.llvm_ty),
            );
            self.line(
                ctx,
                &format!("store {0} {1}, {0}* {typed}", value.llvm_ty, value.repr),
            );
            return raw;
        }
        if value.llvm_ty == "i8*" {
            return value.repr.clone();
        }
        let cast = ctx.temp();
        self.line(
            ctx,
            &format!("{cast} = bitcast {} {} to i8*", value.llvm_ty, value.repr),
        );
        cast
    }

    /// Recover a typed value out of an `i8*` cell.
    pub(super) fn unbox_value(
        &mut self,
        ctx: &mut FuncCtx,
        cell: String,
        element: &SemanticType,
    ) -> Value {
        let lty = llvm_type(element);
        if boxed_size(&lty).is_some() {
            let typed = ctx.temp();
            self.line(ctx, &format!("{typed} = bitcast i8* {cell} to {lty}*"));
            let value = ctx.temp();
            self.line(ctx, &format!("{value} = load {lty}, {lty}* {typed}"));
            return Value::new(value, lty, element.clone());
        }
        if lty == "i8*" {
            return Value::new(cell, lty, element.clone());
        }
        let cast = ctx.temp();
        self.line(ctx, &format!("{cast} = bitcast i8* {cell} to {lty}"));
        Value::new(cast, lty, element.clone())
    }
}
