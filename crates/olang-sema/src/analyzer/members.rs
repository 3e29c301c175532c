// analyzer/members.rs
//
// Member registration and member-body analysis for one class.
//
// Registration resolves parameter and return types and builds overload
// sets without walking bodies; analysis then visits field initializers,
// method bodies, and constructor bodies, in that order.

use super::{Analyzer, TypeError, types_compatible};
use crate::errors::SemanticError;
use crate::registry::{ClassId, CtorDef, MethodDef, MethodId, ParamInfo, VarDef, VarKind};
use crate::scope::ScopeKind;
use crate::types::SemanticType;
use olang_frontend::ast::*;

impl Analyzer<'_> {
    // ===== Registration =====

    pub(super) fn register_members(
        &mut self,
        class: &ClassDecl,
        id: ClassId,
    ) -> Result<(), TypeError> {
        for member in &class.members {
            match member {
                Member::Field(field) => self.register_field(field, id)?,
                Member::Method(method) => self.register_method(method, id)?,
                Member::Ctor(ctor) => self.register_ctor(ctor, id)?,
            }
        }
        Ok(())
    }

    fn register_field(&mut self, field: &FieldDecl, class_id: ClassId) -> Result<(), TypeError> {
        if self
            .registry
            .class(class_id)
            .field_names
            .contains_key(&field.name)
        {
            return Err(TypeError::new(
                SemanticError::DuplicateField {
                    name: self.interner.resolve(field.name).to_string(),
                    span: field.span.into(),
                },
                field.span,
            ));
        }

        // The field's type is its initializer's type, filled in during
        // analysis.
        let var = self.registry.add_var(VarDef {
            name: field.name,
            ty: SemanticType::unknown(),
            kind: VarKind::Field,
            node: field.id,
            is_used: false,
        });
        self.var_of_node.insert(field.id, var);
        let def = self.registry.class_mut(class_id);
        def.fields.push(var);
        def.field_names.insert(field.name, var);
        Ok(())
    }

    fn register_method(&mut self, method: &MethodDecl, class_id: ClassId) -> Result<(), TypeError> {
        let params = self.resolve_params(&method.params)?;
        let return_type = match &method.return_type {
            Some(ty) => self.resolve_type(ty)?,
            None => SemanticType::void(),
        };

        let existing = self
            .registry
            .class(class_id)
            .methods
            .get(&method.name)
            .and_then(|set| {
                set.iter().copied().find(|&mid| {
                    let sym = self.registry.method(mid);
                    sym.params.len() == params.len()
                        && sym
                            .params
                            .iter()
                            .zip(&params)
                            .all(|(a, b)| a.ty.name == b.ty.name)
                })
            });

        let mid = match existing {
            Some(mid) => {
                let stored = &self.registry.method(mid).return_type;
                if stored.name != return_type.name {
                    return Err(TypeError::new(
                        SemanticError::ReturnTypeMismatchBetweenDeclarations {
                            name: self.interner.resolve(method.name).to_string(),
                            expected: stored.name.clone(),
                            found: return_type.name,
                            span: method.span.into(),
                        },
                        method.span,
                    ));
                }
                mid
            }
            None => {
                let mid = self.registry.add_method(MethodDef {
                    owner: class_id,
                    name: method.name,
                    params: params.clone(),
                    return_type,
                    declaration: None,
                    implementation: None,
                });
                let def = self.registry.class_mut(class_id);
                def.methods.entry(method.name).or_default().push(mid);
                def.method_order.push(mid);
                mid
            }
        };

        if method.body.is_none() {
            let sym = self.registry.method(mid);
            // A declaration slot holding the implementation node is a
            // backfill, not a bodyless twin.
            if let Some(decl) = sym.declaration {
                if decl != method.id && sym.implementation != Some(decl) {
                    return Err(TypeError::new(
                        SemanticError::DuplicateForwardDeclaration {
                            name: self.interner.resolve(method.name).to_string(),
                            span: method.span.into(),
                        },
                        method.span,
                    ));
                }
            }
            self.registry.method_mut(mid).declaration = Some(method.id);
        } else {
            let sym = self.registry.method(mid);
            if let Some(existing_impl) = sym.implementation {
                if existing_impl != method.id {
                    return Err(TypeError::new(
                        SemanticError::DuplicateImplementation {
                            name: self.interner.resolve(method.name).to_string(),
                            span: method.span.into(),
                        },
                        method.span,
                    ));
                }
            }
            let sym = self.registry.method_mut(mid);
            sym.implementation = Some(method.id);
            if sym.declaration.is_none() {
                sym.declaration = Some(method.id);
            }
            // Later analysis must see the implementation's parameter nodes.
            sym.params = params;
        }

        Ok(())
    }

    fn register_ctor(&mut self, ctor: &CtorDecl, class_id: ClassId) -> Result<(), TypeError> {
        let params = self.resolve_params(&ctor.params)?;

        let duplicate = self
            .registry
            .class(class_id)
            .ctors
            .iter()
            .any(|&cid| {
                let existing = self.registry.ctor(cid);
                existing.params.len() == params.len()
                    && existing
                        .params
                        .iter()
                        .zip(&params)
                        .all(|(a, b)| a.ty.name == b.ty.name)
            });
        if duplicate {
            return Err(TypeError::new(
                SemanticError::DuplicateConstructorSignature {
                    class: self.registry.class(class_id).name.clone(),
                    span: ctor.span.into(),
                },
                ctor.span,
            ));
        }

        let cid = self.registry.add_ctor(CtorDef {
            owner: class_id,
            node: ctor.id,
            params,
        });
        self.registry.class_mut(class_id).ctors.push(cid);
        Ok(())
    }

    fn resolve_params(&self, params: &[Param]) -> Result<Vec<ParamInfo>, TypeError> {
        params
            .iter()
            .map(|p| {
                Ok(ParamInfo {
                    name: p.name,
                    ty: self.resolve_type(&p.ty)?,
                    node: p.id,
                    span: p.span,
                })
            })
            .collect()
    }

    // ===== Analysis =====

    pub(super) fn analyze_members(
        &mut self,
        class: &mut ClassDecl,
        id: ClassId,
    ) -> Result<(), TypeError> {
        // Fields first, in declaration order: each initializer fixes the
        // field's type.
        for member in class.members.iter_mut() {
            if let Member::Field(field) = member {
                self.analyze_field(field)?;
            }
        }

        for member in class.members.iter_mut() {
            if let Member::Method(method) = member {
                if method.body.is_some() {
                    self.analyze_method(method, id)?;
                }
            }
        }

        for member in class.members.iter_mut() {
            if let Member::Ctor(ctor) = member {
                self.analyze_ctor(ctor, id)?;
            }
        }

        Ok(())
    }

    fn analyze_field(&mut self, field: &FieldDecl) -> Result<(), TypeError> {
        self.enter_root_scope(ScopeKind::ForFields);
        self.current_return = None;

        let ty = self.check_expr(&field.init)?;
        if ty.is_void() {
            return Err(TypeError::new(
                SemanticError::VoidInitializer {
                    name: self.interner.resolve(field.name).to_string(),
                    span: field.span.into(),
                },
                field.span,
            ));
        }

        let var = self.var_of_node[&field.id];
        self.registry.var_mut(var).ty = ty.clone();
        self.var_types.insert(field.id, ty);
        Ok(())
    }

    fn analyze_method(&mut self, method: &mut MethodDecl, class_id: ClassId) -> Result<(), TypeError> {
        let mid = self.implementation_symbol(method, class_id)?;

        self.enter_root_scope(ScopeKind::ForMethod);
        let params = self.registry.method(mid).params.clone();
        self.declare_params(&params)?;

        let ret = self.registry.method(mid).return_type.clone();
        self.current_return = Some(ret.clone());

        match method.body.as_mut().expect("caller checked for a body") {
            MethodBody::Block(block) => {
                self.check_block(block)?;
                self.cleanup_body(block);
            }
            MethodBody::Expr(expr) => {
                if method.return_type.is_none() {
                    return Err(TypeError::new(
                        SemanticError::ExpressionBodyWithoutReturnType {
                            name: self.interner.resolve(method.name).to_string(),
                            span: method.span.into(),
                        },
                        method.span,
                    ));
                }
                let ty = self.check_expr(expr)?;
                if !types_compatible(&ty, &ret) {
                    return Err(TypeError::new(
                        SemanticError::TypeMismatch {
                            expected: ret.name.clone(),
                            found: ty.name,
                            span: expr.span.into(),
                        },
                        expr.span,
                    ));
                }
            }
        }

        self.current_return = None;
        Ok(())
    }

    /// The symbol for a method implementation must be the exact overload
    /// whose parameter list matches the node, and that overload's
    /// implementation slot must reference the node.
    fn implementation_symbol(
        &self,
        method: &MethodDecl,
        class_id: ClassId,
    ) -> Result<MethodId, TypeError> {
        let param_types: Vec<SemanticType> = method
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty))
            .collect::<Result<_, _>>()?;

        let found = self
            .registry
            .class(class_id)
            .methods
            .get(&method.name)
            .and_then(|set| {
                set.iter().copied().find(|&mid| {
                    let sym = self.registry.method(mid);
                    sym.params.len() == param_types.len()
                        && sym
                            .params
                            .iter()
                            .zip(&param_types)
                            .all(|(a, b)| a.ty.name == b.name)
                })
            });

        match found {
            Some(mid) if self.registry.method(mid).implementation == Some(method.id) => Ok(mid),
            _ => Err(TypeError::new(
                SemanticError::SignatureNotDeclared {
                    name: self.interner.resolve(method.name).to_string(),
                    span: method.span.into(),
                },
                method.span,
            )),
        }
    }

    fn analyze_ctor(&mut self, ctor: &mut CtorDecl, class_id: ClassId) -> Result<(), TypeError> {
        let params = self
            .registry
            .class(class_id)
            .ctors
            .iter()
            .copied()
            .find(|&cid| self.registry.ctor(cid).node == ctor.id)
            .map(|cid| self.registry.ctor(cid).params.clone())
            .expect("constructor registered before analysis");

        self.enter_root_scope(ScopeKind::ForMethod);
        self.declare_params(&params)?;
        // `return` is a statement of method bodies only.
        self.current_return = None;

        self.check_block(&mut ctor.body)?;
        self.cleanup_body(&mut ctor.body);
        Ok(())
    }

    fn declare_params(&mut self, params: &[ParamInfo]) -> Result<(), TypeError> {
        for param in params {
            if self.scope.get_local(param.name).is_some() {
                return Err(TypeError::new(
                    SemanticError::DuplicateVariable {
                        name: self.interner.resolve(param.name).to_string(),
                        span: param.span.into(),
                    },
                    param.span,
                ));
            }
            let var = self.registry.add_var(VarDef {
                name: param.name,
                ty: param.ty.clone(),
                kind: VarKind::Parameter,
                node: param.node,
                is_used: false,
            });
            self.var_types.insert(param.node, param.ty.clone());
            self.var_of_node.insert(param.node, var);
            self.scope.define(param.name, var);
        }
        Ok(())
    }
}
