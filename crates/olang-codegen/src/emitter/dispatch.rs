// emitter/dispatch.rs
//
// Runtime-dispatched calls on class receivers: a `switch` over the class
// tag stored in field 0, with one case per hierarchy member implementing
// the signature. Each case casts the receiver to the declaring class and
// calls the mangled implementation directly.

use super::{Emitter, Value};
use crate::context::FuncCtx;
use crate::layout::MethodEntry;
use crate::names::{default_value, llvm_type, mangle_method, sanitize};
use olang_frontend::ast::Expr;
use olang_sema::SemanticType;

impl Emitter<'_> {
    pub(super) fn lower_dispatch(
        &mut self,
        ctx: &mut FuncCtx,
        expr: &Expr,
        receiver: Value,
        static_class: &str,
        method: &str,
        args: &[Expr],
    ) -> Value {
        // Arguments are evaluated once, before the switch; every case
        // re-coerces them to its declaring method's parameter types.
        let arg_values: Vec<Value> = args.iter().map(|a| self.lower_expr(ctx, a)).collect();
        let arg_types: Vec<SemanticType> = arg_values.iter().map(|v| v.ty.clone()).collect();

        let signature = self
            .layouts
            .get(static_class)
            .and_then(|l| l.resolve_method(method, &arg_types))
            .map(|(sig, _)| sig.clone());
        let Some(signature) = signature else {
            self.comment(
                ctx,
                &format!("no implementation for {static_class}.{method}"),
            );
            return self.default_of_expr(expr);
        };

        // Candidates: the static class and all its descendants whose
        // table implements the signature.
        let candidates: Vec<(u32, MethodEntry)> = self
            .layouts
            .hierarchy(static_class)
            .into_iter()
            .filter_map(|layout| {
                layout
                    .methods
                    .get(&signature)
                    .filter(|entry| entry.implementation.is_some())
                    .map(|entry| (layout.class_id, entry.clone()))
            })
            .collect();
        if candidates.is_empty() {
            self.comment(
                ctx,
                &format!("no implementation for {static_class}.{method}"),
            );
            return self.default_of_expr(expr);
        }

        let return_type = candidates[0].1.return_type.clone();
        let ret_llvm = llvm_type(&return_type);
        let result_slot = if ret_llvm != "void" {
            let slot = ctx.temp();
            self.line(ctx, &format!("{slot} = alloca {ret_llvm}"));
            Some(slot)
        } else {
            None
        };

        // Load the class tag.
        let sc = sanitize(static_class);
        let tag_ptr = ctx.temp();
        let tag = ctx.temp();
        self.line(
            ctx,
            &format!(
                "{tag_ptr} = getelementptr %{sc}, %{sc}* {}, i32 0, i32 0",
                receiver.repr
            ),
        );
        self.line(ctx, &format!("{tag} = load i32, i32* {tag_ptr}"));

        let case_labels: Vec<String> = candidates.iter().map(|_| ctx.label("case")).collect();
        let default_label = ctx.label("default");
        let merge_label = ctx.label("merge");

        let cases: Vec<String> = candidates
            .iter()
            .zip(&case_labels)
            .map(|((class_id, _), label)| format!("i32 {class_id}, label %{label}"))
            .collect();
        self.terminator(
            ctx,
            &format!(
                "switch i32 {tag}, label %{default_label} [ {} ]",
                cases.join(" ")
            ),
        );

        for ((_, entry), label) in candidates.iter().zip(&case_labels) {
            self.place_label(ctx, label);
            let declaring = sanitize(&entry.declaring_class);
            let cast = ctx.temp();
            self.line(
                ctx,
                &format!(
                    "{cast} = bitcast %{sc}* {} to %{declaring}*",
                    receiver.repr
                ),
            );

            let mut call_args = format!("%{declaring}* {cast}");
            for (param, value) in entry.param_types.iter().zip(&arg_values) {
                let lty = llvm_type(param);
                let coerced = self.coerce(ctx, value.clone(), &lty);
                call_args.push_str(&format!(", {lty} {}", coerced.repr));
            }

            let mangled = mangle_method(&entry.declaring_class, method, &entry.param_types);
            match &result_slot {
                Some(slot) => {
                    let value = ctx.temp();
                    self.line(
                        ctx,
                        &format!("{value} = call {ret_llvm} @{mangled}({call_args})"),
                    );
                    self.line(ctx, &format!("store {ret_llvm} {value}, {ret_llvm}* {slot}"));
                }
                None => self.line(ctx, &format!("call void @{mangled}({call_args})")),
            }
            self.terminator(ctx, &format!("br label %{merge_label}"));
        }

        // Unknown tag: the default value of the declared return type.
        self.place_label(ctx, &default_label);
        if let Some(slot) = &result_slot {
            self.line(
                ctx,
                &format!(
                    "store {ret_llvm} {}, {ret_llvm}* {slot}",
                    default_value(&ret_llvm)
                ),
            );
        }
        self.terminator(ctx, &format!("br label %{merge_label}"));

        self.place_label(ctx, &merge_label);
        match result_slot {
            Some(slot) => {
                let value = ctx.temp();
                self.line(ctx, &format!("{value} = load {ret_llvm}, {ret_llvm}* {slot}"));
                Value::new(value, ret_llvm, return_type)
            }
            None => Value::void(),
        }
    }
}
