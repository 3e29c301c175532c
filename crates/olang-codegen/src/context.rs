// context.rs
//! Per-function emission state: temporary and label counters, the
//! current-block-terminated flag, and the scoped variable slot map.

use olang_frontend::Symbol;
use olang_sema::SemanticType;
use rustc_hash::FxHashMap;

/// A stack slot holding a local or parameter.
#[derive(Debug, Clone)]
pub struct Slot {
    /// The alloca register, e.g. `%x.addr`.
    pub reg: String,
    pub llvm_ty: String,
    pub ty: SemanticType,
}

/// State for one function body being emitted. Nothing here outlives the
/// function.
pub struct FuncCtx {
    /// The class owning the function; `%this` has this type.
    pub class: String,
    /// LLVM return type of the function.
    pub ret_llvm: String,
    /// Set after a `ret`/`br`/`switch`; instruction emission is
    /// suppressed until a label opens a new block.
    pub terminated: bool,
    temps: u32,
    labels: u32,
    scopes: Vec<FxHashMap<Symbol, Slot>>,
    slot_names: FxHashMap<String, u32>,
}

impl FuncCtx {
    pub fn new(class: &str, ret_llvm: &str) -> Self {
        Self {
            class: class.to_string(),
            ret_llvm: ret_llvm.to_string(),
            terminated: false,
            temps: 0,
            labels: 0,
            scopes: vec![FxHashMap::default()],
            slot_names: FxHashMap::default(),
        }
    }

    /// Fresh temporary: `%t0`, `%t1`, …
    pub fn temp(&mut self) -> String {
        let reg = format!("%t{}", self.temps);
        self.temps += 1;
        reg
    }

    /// Fresh label: `<prefix>_N` with a per-function counter.
    pub fn label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}_{}", self.labels);
        self.labels += 1;
        label
    }

    /// Unique alloca name for a source variable. Shadowing declarations
    /// get a numeric suffix.
    pub fn slot_name(&mut self, name: &str) -> String {
        let n = self.slot_names.entry(name.to_string()).or_insert(0);
        *n += 1;
        if *n == 1 {
            format!("%{name}.addr")
        } else {
            format!("%{name}.addr{n}")
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn define(&mut self, name: Symbol, slot: Slot) {
        self.scopes
            .last_mut()
            .expect("at least the root scope")
            .insert(name, slot);
    }

    pub fn lookup(&self, name: Symbol) -> Option<&Slot> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }
}
