// analyzer/cleanup.rs
//
// The three usage-driven rewrites: statements after a `return` in the
// same flat sequence, unused locals with effect-free initializers, and
// unused fields. All three rewrite the AST in place; the symbol table
// shrinks in step for fields.

use super::Analyzer;
use crate::registry::{ClassId, VarId};
use olang_frontend::ast::*;
use rustc_hash::FxHashSet;

impl Analyzer<'_> {
    /// Clean one analyzed body: truncate after the first `return`, then
    /// drop unused locals whose initializers have no observable effects.
    pub(super) fn cleanup_body(&mut self, block: &mut Block) {
        if let Some(pos) = block
            .items
            .iter()
            .position(|stmt| matches!(stmt.kind, StmtKind::Return(_)))
        {
            block.items.truncate(pos + 1);
        }

        block.items.retain(|stmt| {
            let StmtKind::Var { init, .. } = &stmt.kind else {
                return true;
            };
            let var = self.var_of_node[&stmt.id];
            self.registry.var(var).is_used || self.expr_has_side_effects(init)
        });
    }

    /// Remove fields never marked used, from both the member list and the
    /// symbol table.
    pub(super) fn optimize_class_members(&mut self, class: &mut ClassDecl, id: ClassId) {
        let dead: Vec<VarId> = self
            .registry
            .class(id)
            .fields
            .iter()
            .copied()
            .filter(|&var| !self.registry.var(var).is_used)
            .collect();
        if dead.is_empty() {
            return;
        }

        let dead_nodes: FxHashSet<NodeId> =
            dead.iter().map(|&var| self.registry.var(var).node).collect();
        class.members.retain(|member| match member {
            Member::Field(field) => !dead_nodes.contains(&field.id),
            _ => true,
        });

        let def = self.registry.class_mut(id);
        def.fields.retain(|var| !dead.contains(var));
        def.field_names.retain(|_, var| !dead.contains(var));
    }

    /// Observable side effects: any call, any construction of a
    /// user-defined class, and member accesses on an effectful target.
    /// Literals, identifiers, `this`, and built-in constructors are pure.
    pub(super) fn expr_has_side_effects(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Call { .. } => true,
            ExprKind::ConstructorCall { class, .. } => !matches!(
                self.interner.resolve(*class),
                "Integer" | "Real" | "Boolean" | "Array" | "List"
            ),
            ExprKind::FieldAccess { object, .. } => self.expr_has_side_effects(object),
            ExprKind::IntLit(_)
            | ExprKind::RealLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Identifier(_)
            | ExprKind::This => false,
        }
    }
}
