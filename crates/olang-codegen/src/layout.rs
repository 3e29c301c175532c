// layout.rs
//! Class layouts: class ids, linearized field slots, and signature-keyed
//! method tables.
//!
//! Layouts are built base-first. A class without a base layout (no base,
//! or a built-in base) gets the synthetic `__classId` tag at field index
//! 0; derived classes inherit the base's slots verbatim, so the tag is
//! never duplicated. Method tables start as a copy of the base table and
//! own methods overwrite matching signatures, which is what makes
//! override dispatch work.

use crate::names::canonical_type_name;
use olang_frontend::NodeId;
use olang_sema::{SemanticModel, SemanticType};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct FieldSlot {
    pub name: String,
    pub ty: SemanticType,
    pub index: u32,
}

/// Method table key: name plus the canonical parameter type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    pub name: String,
    pub param_names: Vec<String>,
}

impl MethodSig {
    pub fn new(name: &str, params: &[SemanticType]) -> Self {
        Self {
            name: name.to_string(),
            param_names: params.iter().map(canonical_type_name).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodEntry {
    /// The class whose function implements this signature; dispatch casts
    /// the receiver to this class before calling.
    pub declaring_class: String,
    pub param_types: Vec<SemanticType>,
    pub return_type: SemanticType,
    pub implementation: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ClassLayout {
    pub class_id: u32,
    pub name: String,
    pub base: Option<String>,
    pub fields: Vec<FieldSlot>,
    pub methods: FxHashMap<MethodSig, MethodEntry>,
    /// Signatures in table order: inherited first, then own additions.
    pub method_order: Vec<MethodSig>,
    /// Direct subclasses, filled in as they are built.
    pub derived: Vec<String>,
}

impl ClassLayout {
    pub fn field(&self, name: &str) -> Option<&FieldSlot> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find the table entry whose signature name matches and whose
    /// parameters accept the given argument types.
    pub fn resolve_method(&self, name: &str, args: &[SemanticType]) -> Option<(&MethodSig, &MethodEntry)> {
        self.method_order.iter().find_map(|sig| {
            if sig.name != name {
                return None;
            }
            let entry = &self.methods[sig];
            if entry.param_types.len() == args.len()
                && entry
                    .param_types
                    .iter()
                    .zip(args)
                    .all(|(p, a)| p.is_compatible_with(a))
            {
                Some((sig, entry))
            } else {
                None
            }
        })
    }
}

/// All class layouts, in classId order.
#[derive(Debug, Default)]
pub struct Layouts {
    by_name: FxHashMap<String, ClassLayout>,
    order: Vec<String>,
}

impl Layouts {
    /// Build layouts for every class in the model, topologically by base.
    /// The analyzer has already rejected cycles and unknown bases.
    pub fn build(model: &SemanticModel) -> Self {
        let mut layouts = Layouts::default();
        let mut next_id = 1u32;

        loop {
            let mut progressed = false;
            for class in model.classes_in_order() {
                if layouts.by_name.contains_key(&class.name) {
                    continue;
                }
                let base_layout = class.base.as_deref().and_then(|b| layouts.by_name.get(b));
                let base_pending = class
                    .base
                    .as_deref()
                    .is_some_and(|b| model.class(b).is_some() && base_layout.is_none());
                if base_pending {
                    continue;
                }

                let mut fields = Vec::new();
                let mut methods;
                let mut method_order;
                match base_layout {
                    Some(base) => {
                        for slot in &base.fields {
                            fields.push(FieldSlot {
                                name: slot.name.clone(),
                                ty: slot.ty.clone(),
                                index: fields.len() as u32,
                            });
                        }
                        methods = base.methods.clone();
                        method_order = base.method_order.clone();
                    }
                    None => {
                        // Hierarchy root: the runtime tag comes first.
                        fields.push(FieldSlot {
                            name: "__classId".to_string(),
                            ty: SemanticType::integer(),
                            index: 0,
                        });
                        methods = FxHashMap::default();
                        method_order = Vec::new();
                    }
                }

                for field in &class.fields {
                    fields.push(FieldSlot {
                        name: field.name.clone(),
                        ty: field.ty.clone(),
                        index: fields.len() as u32,
                    });
                }

                for method in &class.methods {
                    let sig = MethodSig::new(&method.name, &method.param_types);
                    let entry = MethodEntry {
                        declaring_class: class.name.clone(),
                        param_types: method.param_types.clone(),
                        return_type: method.return_type.clone(),
                        implementation: method.implementation,
                    };
                    if methods.insert(sig.clone(), entry).is_none() {
                        method_order.push(sig);
                    }
                }

                let layout = ClassLayout {
                    class_id: next_id,
                    name: class.name.clone(),
                    base: class.base.clone(),
                    fields,
                    methods,
                    method_order,
                    derived: Vec::new(),
                };
                next_id += 1;

                if let Some(base_name) = layout
                    .base
                    .as_deref()
                    .filter(|b| layouts.by_name.contains_key(*b))
                {
                    let base_name = base_name.to_string();
                    layouts
                        .by_name
                        .get_mut(&base_name)
                        .expect("checked above")
                        .derived
                        .push(class.name.clone());
                }

                layouts.order.push(class.name.clone());
                layouts.by_name.insert(class.name.clone(), layout);
                progressed = true;
            }

            if !progressed {
                break;
            }
        }

        layouts
    }

    pub fn get(&self, name: &str) -> Option<&ClassLayout> {
        self.by_name.get(name)
    }

    /// Layouts in classId order.
    pub fn in_order(&self) -> impl Iterator<Item = &ClassLayout> + '_ {
        self.order.iter().filter_map(|name| self.by_name.get(name))
    }

    /// A class and all its transitive subclasses, root first then
    /// depth-first through the derived links.
    pub fn hierarchy(&self, root: &str) -> Vec<&ClassLayout> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_string()];
        while let Some(name) = stack.pop() {
            if let Some(layout) = self.by_name.get(&name) {
                out.push(layout);
                for derived in layout.derived.iter().rev() {
                    stack.push(derived.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olang_frontend::Parser;
    use olang_sema::Analyzer;

    fn layouts_for(source: &str) -> Layouts {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().expect("parse failed");
        let interner = parser.into_interner();
        let mut analyzer = Analyzer::new(&interner);
        let model = analyzer.analyze(&mut program).expect("analysis failed");
        Layouts::build(&model)
    }

    #[test]
    fn class_ids_are_assigned_base_first() {
        let layouts = layouts_for(
            "class B extends A is end
             class A is end
             class C extends B is end",
        );
        let ids: Vec<(String, u32)> = layouts
            .in_order()
            .map(|l| (l.name.clone(), l.class_id))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 2),
                ("C".to_string(), 3)
            ]
        );
    }

    #[test]
    fn class_tag_sits_at_index_zero_and_is_not_duplicated() {
        let layouts = layouts_for(
            "class A is
               var x : Integer(1)
               method m : Integer => x
             end
             class B extends A is
               var y : Integer(2)
               method n : Integer => y
             end",
        );

        let a = layouts.get("A").unwrap();
        assert_eq!(a.fields[0].name, "__classId");
        assert_eq!(a.fields.len(), 2);

        let b = layouts.get("B").unwrap();
        let tags = b.fields.iter().filter(|f| f.name == "__classId").count();
        assert_eq!(tags, 1);
        assert_eq!(b.fields[0].name, "__classId");
        assert_eq!(b.fields[1].name, "x");
        assert_eq!(b.fields[2].name, "y");
        assert_eq!(b.fields[2].index, 2);
    }

    #[test]
    fn override_replaces_the_inherited_entry() {
        let layouts = layouts_for(
            "class A is method f : Integer => Integer(1) end
             class B extends A is method f : Integer => Integer(2) end",
        );
        let b = layouts.get("B").unwrap();
        assert_eq!(b.method_order.len(), 1);
        let entry = &b.methods[&b.method_order[0]];
        assert_eq!(entry.declaring_class, "B");

        let a = layouts.get("A").unwrap();
        assert_eq!(a.derived, vec!["B".to_string()]);
    }

    #[test]
    fn inherited_method_keeps_declaring_class() {
        let layouts = layouts_for(
            "class A is method f : Integer => Integer(1) end
             class B extends A is end",
        );
        let b = layouts.get("B").unwrap();
        let (_, entry) = b.resolve_method("f", &[]).unwrap();
        assert_eq!(entry.declaring_class, "A");
    }

    #[test]
    fn hierarchy_enumerates_depth_first_from_the_root() {
        let layouts = layouts_for(
            "class A is end
             class B extends A is end
             class C extends B is end
             class D extends A is end",
        );
        let names: Vec<&str> = layouts.hierarchy("A").iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }

    #[test]
    fn builtin_base_starts_a_new_hierarchy_root() {
        let layouts = layouts_for("class Meters extends Integer is end");
        let m = layouts.get("Meters").unwrap();
        assert_eq!(m.fields[0].name, "__classId");
        assert_eq!(m.class_id, 1);
    }
}
