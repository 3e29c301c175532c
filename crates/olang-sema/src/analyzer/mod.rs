// analyzer/mod.rs

mod calls;
mod cleanup;
mod expr;
mod members;
mod stmt;
#[cfg(test)]
mod tests;

use crate::errors::SemanticError;
use crate::model::{
    SemanticClass, SemanticCtor, SemanticField, SemanticMethod, SemanticModel,
};
use crate::registry::{ClassId, EntityRegistry, VarId};
use crate::scope::{Scope, ScopeKind};
use crate::types::SemanticType;
use olang_frontend::ast::*;
use olang_frontend::{Interner, Span};
use rustc_hash::FxHashMap;

/// A semantic failure: the error plus the offending node's location.
///
/// The first failure aborts analysis; there is no error recovery.
#[derive(Debug)]
pub struct TypeError {
    pub error: SemanticError,
    pub span: Span,
}

impl TypeError {
    pub fn new(error: SemanticError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

/// The semantic analyzer.
///
/// Drives registration, inheritance-ordered class analysis, usage-driven
/// cleanup, and finally snapshots a [`SemanticModel`].
pub struct Analyzer<'a> {
    interner: &'a Interner,
    registry: EntityRegistry,
    expr_types: FxHashMap<NodeId, SemanticType>,
    var_types: FxHashMap<NodeId, SemanticType>,
    /// Declaration node to variable symbol, for cleanup and re-lookup.
    var_of_node: FxHashMap<NodeId, VarId>,
    scope: Scope,
    current_class: Option<ClassId>,
    /// `Some(ty)` while inside a method body (`Void` when no return type
    /// is declared); `None` where `return` is not allowed.
    current_return: Option<SemanticType>,
}

impl<'a> Analyzer<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            registry: EntityRegistry::new(),
            expr_types: FxHashMap::default(),
            var_types: FxHashMap::default(),
            var_of_node: FxHashMap::default(),
            scope: Scope::new(ScopeKind::ForFields),
            current_class: None,
            current_return: None,
        }
    }

    /// Analyze a whole program, rewriting it in place (dead fields, dead
    /// locals, unreachable statements) and producing the semantic model.
    pub fn analyze(&mut self, program: &mut Program) -> Result<SemanticModel, TypeError> {
        self.reset();
        self.register_classes(program)?;
        self.analyze_classes(program)?;
        Ok(self.build_semantic_model())
    }

    /// Borrow the symbol tables (primarily for tests).
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    fn reset(&mut self) {
        self.registry.clear();
        self.expr_types.clear();
        self.var_types.clear();
        self.var_of_node.clear();
        self.scope = Scope::new(ScopeKind::ForFields);
        self.current_class = None;
        self.current_return = None;
    }

    // ===== Pass 1: class registration =====

    fn register_classes(&mut self, program: &Program) -> Result<(), TypeError> {
        for class in &program.classes {
            let name = self.interner.resolve(class.name).to_string();
            let def = crate::registry::ClassDef {
                name: name.clone(),
                base: class.base.map(|b| self.interner.resolve(b).to_string()),
                decl: class.id,
                span: class.span,
                fields: Vec::new(),
                field_names: FxHashMap::default(),
                methods: FxHashMap::default(),
                method_order: Vec::new(),
                ctors: Vec::new(),
                analyzed: false,
            };
            if self.registry.add_class(def).is_none() {
                return Err(TypeError::new(
                    SemanticError::DuplicateClass {
                        name,
                        span: class.span.into(),
                    },
                    class.span,
                ));
            }
        }
        Ok(())
    }

    // ===== Pass 2: inheritance-ordered class analysis =====

    /// Repeatedly sweep the class list, analyzing every class whose base
    /// is built-in, absent, or already analyzed. A sweep that makes no
    /// progress while classes are still pending means an inheritance cycle.
    fn analyze_classes(&mut self, program: &mut Program) -> Result<(), TypeError> {
        loop {
            let mut progressed = false;
            let mut pending = 0usize;

            for class in program.classes.iter_mut() {
                let name = self.interner.resolve(class.name);
                let id = self
                    .registry
                    .lookup_class(name)
                    .expect("registered in pass 1");
                if self.registry.class(id).analyzed {
                    continue;
                }

                let ready = match class.base {
                    None => true,
                    Some(base_sym) => {
                        let base = self.interner.resolve(base_sym);
                        if is_builtin_base(base) {
                            true
                        } else {
                            match self.registry.lookup_class(base) {
                                Some(base_id) => self.registry.class(base_id).analyzed,
                                None => {
                                    return Err(TypeError::new(
                                        SemanticError::UnknownBase {
                                            name: name.to_string(),
                                            base: base.to_string(),
                                            span: class.span.into(),
                                        },
                                        class.span,
                                    ));
                                }
                            }
                        }
                    }
                };

                if ready {
                    self.analyze_class(class, id)?;
                    progressed = true;
                } else {
                    pending += 1;
                }
            }

            if pending == 0 {
                return Ok(());
            }
            if !progressed {
                // Every pending class waits on another pending class.
                let stuck = program
                    .classes
                    .iter()
                    .find(|c| {
                        let name = self.interner.resolve(c.name);
                        let id = self.registry.lookup_class(name).unwrap();
                        !self.registry.class(id).analyzed
                    })
                    .expect("pending > 0");
                return Err(TypeError::new(
                    SemanticError::InheritanceCycleOrUnresolved {
                        name: self.interner.resolve(stuck.name).to_string(),
                        span: stuck.span.into(),
                    },
                    stuck.span,
                ));
            }
        }
    }

    #[tracing::instrument(skip_all, fields(class = %self.interner.resolve(class.name)))]
    fn analyze_class(&mut self, class: &mut ClassDecl, id: ClassId) -> Result<(), TypeError> {
        self.current_class = Some(id);
        self.register_members(class, id)?;
        self.analyze_members(class, id)?;
        self.optimize_class_members(class, id);
        self.registry.class_mut(id).analyzed = true;
        self.current_class = None;
        Ok(())
    }

    // ===== Type resolution =====

    /// Resolve a written type reference to its semantic type.
    pub(crate) fn resolve_type(&self, ty: &TypeExpr) -> Result<SemanticType, TypeError> {
        match &ty.kind {
            TypeExprKind::Named(sym) => {
                let name = self.interner.resolve(*sym);
                if name.eq_ignore_ascii_case("void") {
                    return Ok(SemanticType::void());
                }
                match name {
                    "Integer" => Ok(SemanticType::integer()),
                    "Real" => Ok(SemanticType::real()),
                    "Boolean" => Ok(SemanticType::boolean()),
                    // Bare `Array`/`List` in a parameter annotation: a
                    // legacy form that matches any element type.
                    "Array" | "List" => Ok(SemanticType::standard(name)),
                    _ => {
                        if self.registry.lookup_class(name).is_some() {
                            Ok(SemanticType::class(name))
                        } else {
                            Err(TypeError::new(
                                SemanticError::TypeNotDeclared {
                                    name: name.to_string(),
                                    span: ty.span.into(),
                                },
                                ty.span,
                            ))
                        }
                    }
                }
            }
            TypeExprKind::Generic { name, arg } => {
                let base = self.interner.resolve(*name);
                let element = self.resolve_type(arg)?;
                match base {
                    "Array" => Ok(SemanticType::array_of(&element)),
                    "List" => Ok(SemanticType::list_of(&element)),
                    _ => Err(TypeError::new(
                        SemanticError::TypeNotDeclared {
                            name: base.to_string(),
                            span: ty.span.into(),
                        },
                        ty.span,
                    )),
                }
            }
        }
    }

    // ===== Scope helpers =====

    pub(crate) fn enter_root_scope(&mut self, kind: ScopeKind) {
        self.scope = Scope::new(kind);
    }

    pub(crate) fn push_scope(&mut self) {
        let current = std::mem::replace(&mut self.scope, Scope::new(ScopeKind::Block));
        self.scope = Scope::with_parent(current);
    }

    pub(crate) fn pop_scope(&mut self) {
        let current = std::mem::replace(&mut self.scope, Scope::new(ScopeKind::Block));
        self.scope = current.into_parent().expect("scope chain underflow");
    }

    // ===== Pass 3: model construction =====

    fn build_semantic_model(&mut self) -> SemanticModel {
        let mut classes = FxHashMap::default();
        let mut class_order = Vec::new();

        for (_, def) in self.registry.classes() {
            let fields = def
                .fields
                .iter()
                .map(|&v| {
                    let var = self.registry.var(v);
                    SemanticField {
                        name: self.interner.resolve(var.name).to_string(),
                        ty: var.ty.clone(),
                    }
                })
                .collect();

            let methods = def
                .method_order
                .iter()
                .map(|&m| {
                    let method = self.registry.method(m);
                    SemanticMethod {
                        name: self.interner.resolve(method.name).to_string(),
                        param_types: method.params.iter().map(|p| p.ty.clone()).collect(),
                        return_type: method.return_type.clone(),
                        implementation: method.implementation,
                    }
                })
                .collect();

            let ctors = def
                .ctors
                .iter()
                .map(|&c| {
                    let ctor = self.registry.ctor(c);
                    SemanticCtor {
                        param_types: ctor.params.iter().map(|p| p.ty.clone()).collect(),
                        node: ctor.node,
                    }
                })
                .collect();

            class_order.push(def.name.clone());
            classes.insert(
                def.name.clone(),
                SemanticClass {
                    name: def.name.clone(),
                    base: def.base.clone(),
                    fields,
                    methods,
                    ctors,
                },
            );
        }

        SemanticModel::new(
            std::mem::take(&mut self.expr_types),
            std::mem::take(&mut self.var_types),
            classes,
            class_order,
        )
    }
}

/// Built-in types a class may extend.
pub(crate) fn is_builtin_base(name: &str) -> bool {
    matches!(name, "Integer" | "Real" | "Boolean")
}

/// `Unknown`/`Standard`-tolerant type check shared by assignments,
/// returns, conditions, and argument compatibility.
pub(crate) fn types_compatible(a: &SemanticType, b: &SemanticType) -> bool {
    a.is_compatible_with(b)
}
