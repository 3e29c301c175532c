// scope.rs

use crate::registry::VarId;
use olang_frontend::Symbol;
use rustc_hash::FxHashMap;

/// What a scope chain is rooted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Root scope used while analyzing field initializers.
    ForFields,
    /// Root scope of a method or constructor body; holds the parameters.
    ForMethod,
    /// Child scope for a loop or branch body.
    Block,
}

/// Singly-linked scope chain mapping names to variable symbols.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    variables: FxHashMap<Symbol, VarId>,
    parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            variables: FxHashMap::default(),
            parent: None,
        }
    }

    pub fn with_parent(parent: Scope) -> Self {
        Self {
            kind: ScopeKind::Block,
            variables: FxHashMap::default(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn define(&mut self, name: Symbol, var: VarId) {
        self.variables.insert(name, var);
    }

    /// Look a name up through the whole chain.
    pub fn get(&self, name: Symbol) -> Option<VarId> {
        self.variables
            .get(&name)
            .copied()
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(name)))
    }

    /// Look a name up in this scope only. Duplicate detection must not see
    /// shadowed outer declarations.
    pub fn get_local(&self, name: Symbol) -> Option<VarId> {
        self.variables.get(&name).copied()
    }

    pub fn into_parent(self) -> Option<Scope> {
        self.parent.map(|b| *b)
    }
}
