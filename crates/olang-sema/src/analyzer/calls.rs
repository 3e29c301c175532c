// analyzer/calls.rs
//
// Overload selection and argument compatibility.
//
// Selection is exact: parameter counts equal and every parameter type
// name byte-equal to the argument type name, with `Standard` on either
// side acting as a wildcard. Candidates are tried in declaration order;
// the first match wins.

use super::{Analyzer, TypeError};
use crate::errors::SemanticError;
use crate::registry::{CtorId, MethodId, ParamInfo};
use crate::types::{SemanticType, TypeKind};
use olang_frontend::ast::Expr;
use olang_frontend::Span;

/// Exact-signature test used by overload selection.
pub(super) fn signature_matches(params: &[ParamInfo], args: &[SemanticType]) -> bool {
    params.len() == args.len()
        && params
            .iter()
            .zip(args)
            .all(|(param, arg)| param_matches(&param.ty, arg))
}

fn param_matches(param: &SemanticType, arg: &SemanticType) -> bool {
    if param.kind == TypeKind::Standard || arg.kind == TypeKind::Standard {
        return true;
    }
    param.name == arg.name
}

impl Analyzer<'_> {
    pub(super) fn select_method(
        &self,
        candidates: &[MethodId],
        args: &[SemanticType],
        name: &str,
        span: Span,
    ) -> Result<MethodId, TypeError> {
        for &id in candidates {
            if signature_matches(&self.registry.method(id).params, args) {
                return Ok(id);
            }
        }

        // Distinguish "no overload takes this many arguments" from a type
        // disagreement at matching arity.
        if candidates
            .iter()
            .all(|&id| self.registry.method(id).params.len() != args.len())
        {
            let expected = candidates
                .first()
                .map(|&id| self.registry.method(id).params.len())
                .unwrap_or(0);
            return Err(TypeError::new(
                SemanticError::ArgumentCountMismatch {
                    expected,
                    found: args.len(),
                    span: span.into(),
                },
                span,
            ));
        }

        Err(TypeError::new(
            SemanticError::NoMatchingOverload {
                name: name.to_string(),
                span: span.into(),
            },
            span,
        ))
    }

    pub(super) fn select_ctor(
        &self,
        candidates: &[CtorId],
        args: &[SemanticType],
        class: &str,
        span: Span,
    ) -> Result<CtorId, TypeError> {
        for &id in candidates {
            if signature_matches(&self.registry.ctor(id).params, args) {
                return Ok(id);
            }
        }
        Err(TypeError::new(
            SemanticError::NoMatchingOverload {
                name: class.to_string(),
                span: span.into(),
            },
            span,
        ))
    }

    /// Post-selection compatibility re-check: counts, then name equality
    /// with `Unknown`/`Standard` as wildcards.
    pub(super) fn ensure_arguments_compatible(
        &self,
        params: &[ParamInfo],
        arg_types: &[SemanticType],
        args: &[Expr],
        span: Span,
    ) -> Result<(), TypeError> {
        if params.len() != arg_types.len() {
            return Err(TypeError::new(
                SemanticError::ArgumentCountMismatch {
                    expected: params.len(),
                    found: arg_types.len(),
                    span: span.into(),
                },
                span,
            ));
        }
        for ((param, arg_ty), arg) in params.iter().zip(arg_types).zip(args) {
            self.expect_type(&param.ty, arg_ty, arg)?;
        }
        Ok(())
    }
}
