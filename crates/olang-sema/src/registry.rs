// registry.rs
//! Central registry for all program entities.
//!
//! Definitions are stored in flat vectors and addressed by index id types;
//! classes are additionally indexed by name. The analyzer mutates
//! definitions during analysis (type annotation, usage marking, dead-field
//! removal); the semantic model snapshots them read-only afterwards.

use crate::types::SemanticType;
use olang_frontend::{NodeId, Span, Symbol};
use rustc_hash::FxHashMap;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Index of a [`ClassDef`] in the registry.
    ClassId
);
define_id!(
    /// Index of a [`MethodDef`] in the registry.
    MethodId
);
define_id!(
    /// Index of a [`CtorDef`] in the registry.
    CtorId
);
define_id!(
    /// Index of a [`VarDef`] in the registry.
    VarId
);

/// A resolved parameter of a method or constructor.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: Symbol,
    pub ty: SemanticType,
    pub node: NodeId,
    pub span: Span,
}

#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub base: Option<String>,
    pub decl: NodeId,
    pub span: Span,
    /// Field symbols in declaration order; shrinks when dead fields are
    /// removed.
    pub fields: Vec<VarId>,
    pub field_names: FxHashMap<Symbol, VarId>,
    /// Overload sets: method name to the symbols sharing it.
    pub methods: FxHashMap<Symbol, Vec<MethodId>>,
    /// Method symbols in registration order.
    pub method_order: Vec<MethodId>,
    pub ctors: Vec<CtorId>,
    pub analyzed: bool,
}

#[derive(Debug)]
pub struct MethodDef {
    pub owner: ClassId,
    pub name: Symbol,
    pub params: Vec<ParamInfo>,
    pub return_type: SemanticType,
    /// The bodyless forward declaration, or the implementation node when
    /// no separate forward declaration exists.
    pub declaration: Option<NodeId>,
    /// The AST node carrying the body.
    pub implementation: Option<NodeId>,
}

#[derive(Debug)]
pub struct CtorDef {
    pub owner: ClassId,
    pub node: NodeId,
    pub params: Vec<ParamInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Field,
    Local,
    Parameter,
}

#[derive(Debug)]
pub struct VarDef {
    pub name: Symbol,
    pub ty: SemanticType,
    pub kind: VarKind,
    pub node: NodeId,
    /// Set once a lookup resolves to this variable; never cleared.
    pub is_used: bool,
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    classes: Vec<ClassDef>,
    methods: Vec<MethodDef>,
    ctors: Vec<CtorDef>,
    vars: Vec<VarDef>,
    class_by_name: FxHashMap<String, ClassId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.methods.clear();
        self.ctors.clear();
        self.vars.clear();
        self.class_by_name.clear();
    }

    // ===== Classes =====

    /// Register a class by name. Returns `None` when the name is taken.
    pub fn add_class(&mut self, def: ClassDef) -> Option<ClassId> {
        if self.class_by_name.contains_key(&def.name) {
            return None;
        }
        let id = ClassId::new(self.classes.len());
        self.class_by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        Some(id)
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.index()]
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId::new(i), c))
    }

    // ===== Methods =====

    pub fn add_method(&mut self, def: MethodDef) -> MethodId {
        let id = MethodId::new(self.methods.len());
        self.methods.push(def);
        id
    }

    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDef {
        &mut self.methods[id.index()]
    }

    // ===== Constructors =====

    pub fn add_ctor(&mut self, def: CtorDef) -> CtorId {
        let id = CtorId::new(self.ctors.len());
        self.ctors.push(def);
        id
    }

    pub fn ctor(&self, id: CtorId) -> &CtorDef {
        &self.ctors[id.index()]
    }

    // ===== Variables =====

    pub fn add_var(&mut self, def: VarDef) -> VarId {
        let id = VarId::new(self.vars.len());
        self.vars.push(def);
        id
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.index()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut VarDef {
        &mut self.vars[id.index()]
    }

    // ===== Inheritance-aware lookups =====

    /// Find a field by name in `class` or any of its bases.
    pub fn find_field(&self, class: ClassId, name: Symbol) -> Option<VarId> {
        let mut current = Some(class);
        while let Some(id) = current {
            let def = self.class(id);
            if let Some(&var) = def.field_names.get(&name) {
                return Some(var);
            }
            current = def
                .base
                .as_deref()
                .and_then(|base| self.lookup_class(base));
        }
        None
    }

    /// Find the overload set for a method name, walking base links. The
    /// first class in the chain that declares the name wins.
    pub fn find_overloads(&self, class: ClassId, name: Symbol) -> Option<&[MethodId]> {
        let mut current = Some(class);
        while let Some(id) = current {
            let def = self.class(id);
            if let Some(set) = def.methods.get(&name) {
                return Some(set);
            }
            current = def
                .base
                .as_deref()
                .and_then(|base| self.lookup_class(base));
        }
        None
    }
}
