// emitter/stmt.rs
//
// Statement lowering. Block structure maps one-to-one onto labels and
// branches; the terminated flag keeps instruction emission out of closed
// blocks.

use super::Emitter;
use crate::context::{FuncCtx, Slot};
use crate::names::llvm_type;
use olang_frontend::ast::*;
use olang_sema::TypeKind;

impl Emitter<'_> {
    pub(crate) fn lower_block(&mut self, ctx: &mut FuncCtx, block: &Block) {
        for stmt in &block.items {
            self.lower_stmt(ctx, stmt);
        }
    }

    fn lower_stmt(&mut self, ctx: &mut FuncCtx, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var { name, init } => {
                let ty = self
                    .model
                    .var_type(stmt.id)
                    .cloned()
                    .unwrap_or_else(|| {
                        self.model
                            .expr_type(init.id)
                            .cloned()
                            .unwrap_or_else(olang_sema::SemanticType::unknown)
                    });
                let lty = llvm_type(&ty);
                let value = self.lower_expr(ctx, init);
                let value = self.coerce(ctx, value, &lty);

                let slot_name = self.interner.resolve(*name).to_string();
                let reg = ctx.slot_name(&slot_name);
                self.line(ctx, &format!("{reg} = alloca {lty}"));
                self.line(ctx, &format!("store {lty} {}, {lty}* {reg}", value.repr));
                ctx.define(
                    *name,
                    Slot {
                        reg,
                        llvm_ty: lty,
                        ty,
                    },
                );
            }
            StmtKind::Assign { target, value } => self.lower_assign(ctx, target, value),
            StmtKind::While { cond, body } => self.lower_while(ctx, cond, body),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => self.lower_if(ctx, cond, then_body, else_body.as_ref()),
            StmtKind::Return(value) => self.lower_return(ctx, value.as_ref()),
            StmtKind::Expr(expr) => {
                self.lower_expr(ctx, expr);
            }
        }
    }

    /// Value first, then the target pointer, then one store.
    fn lower_assign(&mut self, ctx: &mut FuncCtx, target: &Expr, value: &Expr) {
        let value = self.lower_expr(ctx, value);

        match &target.kind {
            ExprKind::Identifier(sym) => {
                if let Some(slot) = ctx.lookup(*sym).cloned() {
                    let value = self.coerce(ctx, value, &slot.llvm_ty);
                    self.line(
                        ctx,
                        &format!("store {0} {1}, {0}* {2}", slot.llvm_ty, value.repr, slot.reg),
                    );
                    return;
                }
                let class = ctx.class.clone();
                let name = self.interner.resolve(*sym).to_string();
                let Some(field) = self.field_slot(&class, &name) else {
                    self.comment(ctx, &format!("unresolved assignment target {name}"));
                    return;
                };
                let ptr = self.field_ptr(ctx, "%this", &class, &field);
                let lty = llvm_type(&field.ty);
                let value = self.coerce(ctx, value, &lty);
                self.line(ctx, &format!("store {lty} {}, {lty}* {ptr}", value.repr));
            }
            ExprKind::FieldAccess { object, field } => {
                let base = self.lower_expr(ctx, object);
                let name = self.interner.resolve(*field).to_string();
                if base.ty.kind != TypeKind::Class {
                    self.comment(ctx, &format!("assignment into non-class value .{name}"));
                    return;
                }
                let class = base.ty.name.clone();
                let Some(slot) = self.field_slot(&class, &name) else {
                    self.comment(ctx, &format!("unknown field {class}.{name}"));
                    return;
                };
                let ptr = self.field_ptr(ctx, &base.repr, &class, &slot);
                let lty = llvm_type(&slot.ty);
                let value = self.coerce(ctx, value, &lty);
                self.line(ctx, &format!("store {lty} {}, {lty}* {ptr}", value.repr));
            }
            _ => self.comment(ctx, "unsupported assignment target"),
        }
    }

    fn lower_while(&mut self, ctx: &mut FuncCtx, cond: &Expr, body: &Block) {
        let cond_label = ctx.label("cond");
        let body_label = ctx.label("body");
        let exit_label = ctx.label("exit");

        self.terminator(ctx, &format!("br label %{cond_label}"));
        self.place_label(ctx, &cond_label);
        let test = self.lower_expr(ctx, cond);
        let test = self.coerce(ctx, test, "i1");
        self.terminator(
            ctx,
            &format!(
                "br i1 {}, label %{body_label}, label %{exit_label}",
                test.repr
            ),
        );

        self.place_label(ctx, &body_label);
        ctx.push_scope();
        self.lower_block(ctx, body);
        ctx.pop_scope();
        self.terminator(ctx, &format!("br label %{cond_label}"));

        self.place_label(ctx, &exit_label);
    }

    fn lower_if(
        &mut self,
        ctx: &mut FuncCtx,
        cond: &Expr,
        then_body: &Block,
        else_body: Option<&Block>,
    ) {
        let test = self.lower_expr(ctx, cond);
        let test = self.coerce(ctx, test, "i1");

        let then_label = ctx.label("then");
        let else_label = else_body.map(|_| ctx.label("else"));
        let merge_label = ctx.label("merge");

        let false_target = else_label.as_deref().unwrap_or(&merge_label);
        self.terminator(
            ctx,
            &format!(
                "br i1 {}, label %{then_label}, label %{false_target}",
                test.repr
            ),
        );

        self.place_label(ctx, &then_label);
        ctx.push_scope();
        self.lower_block(ctx, then_body);
        ctx.pop_scope();
        let then_falls = !ctx.terminated;
        self.terminator(ctx, &format!("br label %{merge_label}"));

        let mut reaches_merge = then_falls || else_body.is_none();
        if let (Some(body), Some(label)) = (else_body, else_label.as_deref()) {
            self.place_label(ctx, label);
            ctx.push_scope();
            self.lower_block(ctx, body);
            ctx.pop_scope();
            reaches_merge |= !ctx.terminated;
            self.terminator(ctx, &format!("br label %{merge_label}"));
        }

        // With both branches closed (inner returns) the merge block would
        // have no predecessor and no terminator; leave it out.
        if reaches_merge {
            self.place_label(ctx, &merge_label);
        }
    }

    fn lower_return(&mut self, ctx: &mut FuncCtx, value: Option<&Expr>) {
        match value {
            None => self.terminator(ctx, "ret void"),
            Some(expr) => {
                let ret_llvm = ctx.ret_llvm.clone();
                let value = self.lower_expr(ctx, expr);
                let value = self.coerce(ctx, value, &ret_llvm);
                self.terminator(ctx, &format!("ret {ret_llvm} {}", value.repr));
            }
        }
    }
}
