// names.rs
//! Canonical type names, symbol mangling, and the LLVM type mapping.

use olang_sema::{SemanticType, TypeKind};

/// Canonical name of a type as used in mangled symbols and method tables.
/// Primitives keep their short name; reference type names are sanitized to
/// alphanumerics and `_`.
pub fn canonical_type_name(ty: &SemanticType) -> String {
    match ty.kind {
        TypeKind::Integer | TypeKind::Real | TypeKind::Boolean | TypeKind::Void => ty.name.clone(),
        _ => sanitize(&ty.name),
    }
}

/// Replace every non-alphanumeric character with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `@<Class>_<method>(__<TypeName>)*`
pub fn mangle_method(class: &str, method: &str, params: &[SemanticType]) -> String {
    let mut out = format!("{}_{}", sanitize(class), method);
    for param in params {
        out.push_str("__");
        out.push_str(&canonical_type_name(param));
    }
    out
}

/// `@<Class>_ctor(__<TypeName>)*`
pub fn mangle_ctor(class: &str, params: &[SemanticType]) -> String {
    let mut out = format!("{}_ctor", sanitize(class));
    for param in params {
        out.push_str("__");
        out.push_str(&canonical_type_name(param));
    }
    out
}

/// LLVM type for a semantic type. References are always pointers; the
/// wildcard kinds travel as `i8*`.
pub fn llvm_type(ty: &SemanticType) -> String {
    match ty.kind {
        TypeKind::Void => "void".to_string(),
        TypeKind::Integer => "i32".to_string(),
        TypeKind::Real => "double".to_string(),
        TypeKind::Boolean => "i1".to_string(),
        TypeKind::Array => "%Array*".to_string(),
        TypeKind::List => "%List*".to_string(),
        TypeKind::Class => format!("%{}*", sanitize(&ty.name)),
        // Bare `Array`/`List` parameter annotations keep their runtime
        // representation; any other wildcard travels as `i8*`.
        TypeKind::Standard => match ty.name.as_str() {
            "Array" => "%Array*".to_string(),
            "List" => "%List*".to_string(),
            _ => "i8*".to_string(),
        },
        TypeKind::Unknown => "i8*".to_string(),
    }
}

/// The zero/null value for an LLVM type.
pub fn default_value(llvm_ty: &str) -> &'static str {
    match llvm_ty {
        "i32" => "0",
        "double" => "0.0",
        "i1" => "0",
        _ => "null",
    }
}

/// Format a real literal so LLVM's float syntax accepts it: the shortest
/// round-trip decimal form, forced to contain a decimal point.
pub fn format_real(value: f64) -> String {
    let mut s = format!("{value:?}");
    if !s.contains('.') {
        if let Some(e) = s.find(['e', 'E']) {
            s.insert_str(e, ".0");
        } else {
            s.push_str(".0");
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_type_name(&SemanticType::integer()), "Integer");
        let arr = SemanticType::array_of(&SemanticType::integer());
        assert_eq!(canonical_type_name(&arr), "Array_Integer_");
        assert_eq!(canonical_type_name(&SemanticType::class("Point")), "Point");
    }

    #[test]
    fn mangling() {
        let params = [SemanticType::integer(), SemanticType::real()];
        assert_eq!(mangle_method("C", "f", &params), "C_f__Integer__Real");
        assert_eq!(mangle_method("C", "f", &[]), "C_f");
        assert_eq!(mangle_ctor("C", &params[..1]), "C_ctor__Integer");
    }

    #[test]
    fn llvm_types() {
        assert_eq!(llvm_type(&SemanticType::integer()), "i32");
        assert_eq!(llvm_type(&SemanticType::real()), "double");
        assert_eq!(llvm_type(&SemanticType::boolean()), "i1");
        assert_eq!(
            llvm_type(&SemanticType::array_of(&SemanticType::integer())),
            "%Array*"
        );
        assert_eq!(llvm_type(&SemanticType::class("Main")), "%Main*");
        assert_eq!(llvm_type(&SemanticType::standard("Standard")), "i8*");
        assert_eq!(llvm_type(&SemanticType::standard("Array")), "%Array*");
    }

    #[test]
    fn real_formatting_always_parses_as_float() {
        assert_eq!(format_real(2.0), "2.0");
        assert_eq!(format_real(3.14), "3.14");
        assert_eq!(format_real(0.5), "0.5");
        assert!(format_real(1e300).contains('.'));
    }
}
