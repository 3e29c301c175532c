// model.rs
//! Read-only snapshot of the analysis results, consumed by the code
//! generator.
//!
//! Everything is keyed by AST node id or by class name string; the model
//! holds no references back into the symbol tables.

use crate::types::SemanticType;
use olang_frontend::NodeId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct SemanticField {
    pub name: String,
    pub ty: SemanticType,
}

#[derive(Debug, Clone)]
pub struct SemanticMethod {
    pub name: String,
    pub param_types: Vec<SemanticType>,
    pub return_type: SemanticType,
    /// AST node carrying the body, when one exists.
    pub implementation: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SemanticCtor {
    pub param_types: Vec<SemanticType>,
    pub node: NodeId,
}

/// Mirror projection of one analyzed class.
#[derive(Debug, Clone)]
pub struct SemanticClass {
    pub name: String,
    pub base: Option<String>,
    /// Surviving fields in declaration order.
    pub fields: Vec<SemanticField>,
    /// Method overloads in registration order.
    pub methods: Vec<SemanticMethod>,
    pub ctors: Vec<SemanticCtor>,
}

/// The cross-referenced semantic model: expression types, variable types,
/// and per-class projections.
#[derive(Debug, Default)]
pub struct SemanticModel {
    expr_types: FxHashMap<NodeId, SemanticType>,
    var_types: FxHashMap<NodeId, SemanticType>,
    classes: FxHashMap<String, SemanticClass>,
    class_order: Vec<String>,
}

impl SemanticModel {
    pub(crate) fn new(
        expr_types: FxHashMap<NodeId, SemanticType>,
        var_types: FxHashMap<NodeId, SemanticType>,
        classes: FxHashMap<String, SemanticClass>,
        class_order: Vec<String>,
    ) -> Self {
        Self {
            expr_types,
            var_types,
            classes,
            class_order,
        }
    }

    /// Type of an expression node.
    pub fn expr_type(&self, id: NodeId) -> Option<&SemanticType> {
        self.expr_types.get(&id)
    }

    /// Type of a field, local, or parameter declaration node.
    pub fn var_type(&self, id: NodeId) -> Option<&SemanticType> {
        self.var_types.get(&id)
    }

    pub fn class(&self, name: &str) -> Option<&SemanticClass> {
        self.classes.get(name)
    }

    /// Classes in program declaration order.
    pub fn classes_in_order(&self) -> impl Iterator<Item = &SemanticClass> + '_ {
        self.class_order.iter().filter_map(|name| self.classes.get(name))
    }

    pub fn expr_types(&self) -> &FxHashMap<NodeId, SemanticType> {
        &self.expr_types
    }

    pub fn var_types(&self) -> &FxHashMap<NodeId, SemanticType> {
        &self.var_types
    }
}
