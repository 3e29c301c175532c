// emitter/mod.rs
//! LLVM IR text emission.
//!
//! Output order is fixed: the module preamble, class type definitions,
//! constructors in classId order, methods in the same order, then
//! `@main`. Function bodies use the alloca/load/store discipline so that
//! mem2reg can promote slots to SSA registers.

mod dispatch;
mod expr;
mod intrinsics;
mod stmt;
#[cfg(test)]
mod tests;

use crate::context::{FuncCtx, Slot};
use crate::errors::CodegenError;
use crate::layout::{FieldSlot, Layouts};
use crate::names::{default_value, llvm_type, mangle_ctor, mangle_method, sanitize};
use crate::runtime::MODULE_PREAMBLE;
use olang_frontend::ast::*;
use olang_frontend::Interner;
use olang_sema::{SemanticModel, SemanticType};
use rustc_hash::FxHashMap;

/// A lowered expression: its register or immediate text, its LLVM type,
/// and its semantic type.
#[derive(Debug, Clone)]
pub(crate) struct Value {
    pub repr: String,
    pub llvm_ty: String,
    pub ty: SemanticType,
}

impl Value {
    pub(crate) fn new(repr: impl Into<String>, llvm_ty: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            repr: repr.into(),
            llvm_ty: llvm_ty.into(),
            ty,
        }
    }

    pub(crate) fn void() -> Self {
        Self::new("", "void", SemanticType::void())
    }
}

/// Emits one module from the analyzed program.
pub struct Emitter<'a> {
    pub(crate) interner: &'a Interner,
    pub(crate) model: &'a SemanticModel,
    pub(crate) layouts: Layouts,
    class_decls: FxHashMap<String, &'a ClassDecl>,
    out: String,
}

impl<'a> Emitter<'a> {
    pub fn new(program: &'a Program, interner: &'a Interner, model: &'a SemanticModel) -> Self {
        let class_decls = program
            .classes
            .iter()
            .map(|c| (interner.resolve(c.name).to_string(), c))
            .collect();
        Self {
            interner,
            model,
            layouts: Layouts::build(model),
            class_decls,
            out: String::new(),
        }
    }

    /// Emit the whole module.
    #[tracing::instrument(skip_all)]
    pub fn emit(mut self) -> Result<String, CodegenError> {
        self.out.push_str(MODULE_PREAMBLE);
        self.emit_type_defs();

        let order: Vec<String> = self.layouts.in_order().map(|l| l.name.clone()).collect();
        for name in &order {
            self.emit_class_ctors(name)?;
        }
        for name in &order {
            self.emit_class_methods(name)?;
        }
        self.emit_main()?;
        Ok(self.out)
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    // ===== Type definitions =====

    fn emit_type_defs(&mut self) {
        let mut defs = String::new();
        for layout in self.layouts.in_order() {
            let fields: Vec<String> = layout.fields.iter().map(|f| llvm_type(&f.ty)).collect();
            defs.push_str(&format!(
                "\n%{} = type {{ {} }}",
                sanitize(&layout.name),
                fields.join(", ")
            ));
        }
        defs.push('\n');
        self.out.push_str(&defs);
    }

    // ===== Constructors =====

    fn emit_class_ctors(&mut self, class_name: &str) -> Result<(), CodegenError> {
        let Some(class) = self.class_decls.get(class_name).copied() else {
            return Ok(());
        };
        for member in &class.members {
            if let Member::Ctor(ctor) = member {
                self.emit_ctor(class_name, ctor)?;
            }
        }
        Ok(())
    }

    fn emit_ctor(&mut self, class_name: &str, ctor: &'a CtorDecl) -> Result<(), CodegenError> {
        let param_types = self.param_types(&ctor.params)?;
        let mangled = mangle_ctor(class_name, &param_types);

        let mut ctx = FuncCtx::new(class_name, "void");
        self.open_function(&mut ctx, "void", &mangled, class_name, &ctor.params, &param_types);
        self.lower_block(&mut ctx, &ctor.body);
        if !ctx.terminated {
            self.terminator(&mut ctx, "ret void");
        }
        self.close_function();
        Ok(())
    }

    // ===== Methods =====

    fn emit_class_methods(&mut self, class_name: &str) -> Result<(), CodegenError> {
        let Some(class) = self.class_decls.get(class_name).copied() else {
            return Ok(());
        };
        for member in &class.members {
            if let Member::Method(method) = member {
                if method.body.is_some() {
                    self.emit_method(class_name, method)?;
                }
            }
        }
        Ok(())
    }

    fn emit_method(&mut self, class_name: &str, method: &'a MethodDecl) -> Result<(), CodegenError> {
        let name = self.interner.resolve(method.name).to_string();
        let info = self
            .model
            .class(class_name)
            .and_then(|c| {
                c.methods
                    .iter()
                    .find(|m| m.implementation == Some(method.id))
            })
            .ok_or_else(|| CodegenError::MissingType {
                what: format!("method {class_name}.{name}"),
            })?;
        let param_types = info.param_types.clone();
        let return_type = info.return_type.clone();

        let ret_llvm = llvm_type(&return_type);
        let mangled = mangle_method(class_name, &name, &param_types);

        let mut ctx = FuncCtx::new(class_name, &ret_llvm);
        self.open_function(&mut ctx, &ret_llvm, &mangled, class_name, &method.params, &param_types);

        match method.body.as_ref().expect("caller checked for a body") {
            MethodBody::Block(block) => {
                self.lower_block(&mut ctx, block);
                if !ctx.terminated {
                    let fallback = if ret_llvm == "void" {
                        "ret void".to_string()
                    } else {
                        format!("ret {ret_llvm} {}", default_value(&ret_llvm))
                    };
                    self.terminator(&mut ctx, &fallback);
                }
            }
            MethodBody::Expr(expr) => {
                let value = self.lower_expr(&mut ctx, expr);
                let value = self.coerce(&mut ctx, value, &ret_llvm);
                self.terminator(&mut ctx, &format!("ret {ret_llvm} {}", value.repr));
            }
        }

        self.close_function();
        Ok(())
    }

    // ===== main =====

    fn emit_main(&mut self) -> Result<(), CodegenError> {
        self.out.push_str("\ndefine i32 @main() {\nentry:\n");
        // The start class is `Main` when declared, else the first class in
        // program order with a layout.
        let start = if self.layouts.get("Main").is_some() {
            Some("Main".to_string())
        } else {
            self.model
                .classes_in_order()
                .map(|c| c.name.clone())
                .find(|name| self.layouts.get(name).is_some())
        };

        let mut ctx = FuncCtx::new(start.as_deref().unwrap_or(""), "i32");
        if let Some(class_name) = start {
            let object = self.emit_allocation(&mut ctx, &class_name);

            let zero_arg_ctor = self
                .model
                .class(&class_name)
                .map(|c| (!c.ctors.is_empty(), c.ctors.iter().any(|k| k.param_types.is_empty())));
            match zero_arg_ctor {
                Some((_, true)) => {
                    let mangled = mangle_ctor(&class_name, &[]);
                    let c = sanitize(&class_name);
                    self.line(
                        &mut ctx,
                        &format!("call void @{mangled}(%{c}* {})", object.repr),
                    );
                }
                Some((true, false)) => {
                    self.line(
                        &mut ctx,
                        &format!("; no zero-argument constructor for {class_name}"),
                    );
                }
                _ => {}
            }
        }
        self.terminator(&mut ctx, "ret i32 0");
        self.close_function();
        Ok(())
    }

    // ===== Object allocation =====

    /// Heap-allocate an instance: size via the `getelementptr null` trick,
    /// `malloc`, then the class tag into field 0.
    pub(crate) fn emit_allocation(&mut self, ctx: &mut FuncCtx, class_name: &str) -> Value {
        let class_id = self
            .layouts
            .get(class_name)
            .map(|l| l.class_id)
            .unwrap_or(0);
        let c = sanitize(class_name);

        let size_ptr = ctx.temp();
        let size = ctx.temp();
        let raw = ctx.temp();
        let object = ctx.temp();
        let tag_ptr = ctx.temp();
        self.line(ctx, &format!("{size_ptr} = getelementptr %{c}, %{c}* null, i32 1"));
        self.line(ctx, &format!("{size} = ptrtoint %{c}* {size_ptr} to i64"));
        self.line(ctx, &format!("{raw} = call i8* @malloc(i64 {size})"));
        self.line(ctx, &format!("{object} = bitcast i8* {raw} to %{c}*"));
        self.line(
            ctx,
            &format!("{tag_ptr} = getelementptr %{c}, %{c}* {object}, i32 0, i32 0"),
        );
        self.line(ctx, &format!("store i32 {class_id}, i32* {tag_ptr}"));

        Value::new(object, format!("%{c}*"), SemanticType::class(class_name))
    }

    // ===== Function scaffolding =====

    fn open_function(
        &mut self,
        ctx: &mut FuncCtx,
        ret_llvm: &str,
        mangled: &str,
        class_name: &str,
        params: &[Param],
        param_types: &[SemanticType],
    ) {
        let c = sanitize(class_name);
        let mut sig = format!("\ndefine {ret_llvm} @{mangled}(%{c}* %this");
        for (param, ty) in params.iter().zip(param_types) {
            let pname = self.interner.resolve(param.name);
            sig.push_str(&format!(", {} %{pname}", llvm_type(ty)));
        }
        sig.push_str(") {\nentry:\n");
        self.out.push_str(&sig);

        // Copy parameters into stack slots so they behave like locals.
        for (param, ty) in params.iter().zip(param_types) {
            let pname = self.interner.resolve(param.name).to_string();
            let lty = llvm_type(ty);
            let slot = ctx.slot_name(&pname);
            self.line(ctx, &format!("{slot} = alloca {lty}"));
            self.line(ctx, &format!("store {lty} %{pname}, {lty}* {slot}"));
            ctx.define(
                param.name,
                Slot {
                    reg: slot,
                    llvm_ty: lty,
                    ty: ty.clone(),
                },
            );
        }
    }

    fn close_function(&mut self) {
        self.out.push_str("}\n");
    }

    fn param_types(&self, params: &[Param]) -> Result<Vec<SemanticType>, CodegenError> {
        params
            .iter()
            .map(|p| {
                self.model
                    .var_type(p.id)
                    .cloned()
                    .ok_or_else(|| CodegenError::MissingType {
                        what: format!("parameter {}", self.interner.resolve(p.name)),
                    })
            })
            .collect()
    }

    // ===== Emission primitives =====

    /// Append one instruction line unless the current block is closed.
    pub(crate) fn line(&mut self, ctx: &mut FuncCtx, text: &str) {
        if !ctx.terminated {
            self.out.push_str("  ");
            self.out.push_str(text);
            self.out.push('\n');
        }
    }

    /// Append a block terminator and close the current block.
    pub(crate) fn terminator(&mut self, ctx: &mut FuncCtx, text: &str) {
        if !ctx.terminated {
            self.out.push_str("  ");
            self.out.push_str(text);
            self.out.push('\n');
            ctx.terminated = true;
        }
    }

    /// Open a new block at `label`.
    pub(crate) fn place_label(&mut self, ctx: &mut FuncCtx, label: &str) {
        self.out.push_str(label);
        self.out.push_str(":\n");
        ctx.terminated = false;
    }

    pub(crate) fn comment(&mut self, ctx: &mut FuncCtx, text: &str) {
        self.line(ctx, &format!("; {text}"));
    }

    // ===== Shared lookups =====

    /// Cloned field slot of `class` (or an inherited one), by source name.
    pub(crate) fn field_slot(&self, class: &str, field: &str) -> Option<FieldSlot> {
        self.layouts.get(class).and_then(|l| l.field(field)).cloned()
    }

    /// Pointer to a field of `object`.
    pub(crate) fn field_ptr(
        &mut self,
        ctx: &mut FuncCtx,
        object: &str,
        class: &str,
        slot: &FieldSlot,
    ) -> String {
        let c = sanitize(class);
        let ptr = ctx.temp();
        self.line(
            ctx,
            &format!(
                "{ptr} = getelementptr %{c}, %{c}* {object}, i32 0, i32 {}",
                slot.index
            ),
        );
        ptr
    }

    /// Default value typed by the model's entry for `expr`.
    pub(crate) fn default_of_expr(&mut self, expr: &Expr) -> Value {
        let ty = self
            .model
            .expr_type(expr.id)
            .cloned()
            .unwrap_or_else(SemanticType::unknown);
        let lty = llvm_type(&ty);
        Value::new(default_value(&lty), lty, ty)
    }

    // ===== Primitive conversions =====

    /// Convert `value` to `target` LLVM type where a conversion exists;
    /// pointer kinds bitcast, numeric kinds go through the fixed widening
    /// and narrowing instructions.
    pub(crate) fn coerce(&mut self, ctx: &mut FuncCtx, value: Value, target: &str) -> Value {
        if value.llvm_ty == target || target == "void" {
            return value;
        }
        let ty = value.ty.clone();

        let converted = match (value.llvm_ty.as_str(), target) {
            ("i32", "double") => self.unary(ctx, "sitofp i32", &value.repr, "to double"),
            ("double", "i32") => self.unary(ctx, "fptosi double", &value.repr, "to i32"),
            ("i1", "i32") => self.unary(ctx, "zext i1", &value.repr, "to i32"),
            ("i1", "double") => {
                let wide = self.unary(ctx, "zext i1", &value.repr, "to i32");
                self.unary(ctx, "sitofp i32", &wide, "to double")
            }
            ("i32", "i1") => {
                let t = ctx.temp();
                self.line(ctx, &format!("{t} = icmp ne i32 {}, 0", value.repr));
                t
            }
            ("double", "i1") => {
                let t = ctx.temp();
                self.line(ctx, &format!("{t} = fcmp one double {}, 0.0", value.repr));
                t
            }
            (from, to) if from.ends_with('*') && to.ends_with('*') => {
                let t = ctx.temp();
                self.line(ctx, &format!("{t} = bitcast {from} {} to {to}", value.repr));
                t
            }
            _ => {
                self.comment(ctx, &format!("cannot convert {} to {target}", value.llvm_ty));
                default_value(target).to_string()
            }
        };

        Value::new(converted, target, ty)
    }

    fn unary(&mut self, ctx: &mut FuncCtx, op: &str, operand: &str, suffix: &str) -> String {
        let t = ctx.temp();
        self.line(ctx, &format!("{t} = {op} {operand} {suffix}"));
        t
    }
}
