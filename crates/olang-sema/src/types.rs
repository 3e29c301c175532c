// types.rs

/// The nine semantic type kinds of O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Integer,
    Real,
    Boolean,
    Array,
    List,
    Class,
    Standard,
    Unknown,
}

/// A semantic type: a name plus its kind.
///
/// Array and List types carry their element inside the name
/// (`Array[Integer]`, `List[Point]`). All type comparisons in the
/// analyzer go through name equality; the kind alone is never compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticType {
    pub name: String,
    pub kind: TypeKind,
}

impl SemanticType {
    pub fn void() -> Self {
        Self {
            name: "Void".to_string(),
            kind: TypeKind::Void,
        }
    }

    pub fn integer() -> Self {
        Self {
            name: "Integer".to_string(),
            kind: TypeKind::Integer,
        }
    }

    pub fn real() -> Self {
        Self {
            name: "Real".to_string(),
            kind: TypeKind::Real,
        }
    }

    pub fn boolean() -> Self {
        Self {
            name: "Boolean".to_string(),
            kind: TypeKind::Boolean,
        }
    }

    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Class,
        }
    }

    pub fn array_of(element: &SemanticType) -> Self {
        Self {
            name: format!("Array[{}]", element.name),
            kind: TypeKind::Array,
        }
    }

    pub fn list_of(element: &SemanticType) -> Self {
        Self {
            name: format!("List[{}]", element.name),
            kind: TypeKind::List,
        }
    }

    /// The wildcard type. `name` is the source spelling that produced it
    /// (a bare `Array`/`List`, or `Standard` for "any result").
    pub fn standard(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Standard,
        }
    }

    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            kind: TypeKind::Unknown,
        }
    }

    /// Reconstruct a type from its name alone. Used when recovering the
    /// element type out of a composite `Array[E]`/`List[E]` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Integer" => Self::integer(),
            "Real" => Self::real(),
            "Boolean" => Self::boolean(),
            "Void" => Self::void(),
            "Unknown" => Self::unknown(),
            "Standard" => Self::standard("Standard"),
            _ => {
                if let Some(inner) = name.strip_prefix("Array[").and_then(|s| s.strip_suffix(']')) {
                    Self {
                        name: format!("Array[{inner}]"),
                        kind: TypeKind::Array,
                    }
                } else if let Some(inner) =
                    name.strip_prefix("List[").and_then(|s| s.strip_suffix(']'))
                {
                    Self {
                        name: format!("List[{inner}]"),
                        kind: TypeKind::List,
                    }
                } else {
                    Self::class(name)
                }
            }
        }
    }

    /// Element type of an `Array[E]`/`List[E]` composite name.
    pub fn element(&self) -> Option<SemanticType> {
        let inner = self
            .name
            .strip_prefix("Array[")
            .or_else(|| self.name.strip_prefix("List["))?
            .strip_suffix(']')?;
        Some(Self::from_name(inner))
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Integer | TypeKind::Real | TypeKind::Boolean
        )
    }

    /// Name equality with `Unknown` and `Standard` acting as wildcards.
    pub fn is_compatible_with(&self, other: &SemanticType) -> bool {
        if matches!(self.kind, TypeKind::Unknown | TypeKind::Standard)
            || matches!(other.kind, TypeKind::Unknown | TypeKind::Standard)
        {
            return true;
        }
        self.name == other.name
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_names() {
        let arr = SemanticType::array_of(&SemanticType::integer());
        assert_eq!(arr.name, "Array[Integer]");
        assert_eq!(arr.kind, TypeKind::Array);
        assert_eq!(arr.element().unwrap().name, "Integer");

        let nested = SemanticType::array_of(&arr);
        assert_eq!(nested.name, "Array[Array[Integer]]");
        assert_eq!(nested.element().unwrap().name, "Array[Integer]");
        assert_eq!(nested.element().unwrap().kind, TypeKind::Array);
    }

    #[test]
    fn wildcard_compatibility() {
        let int = SemanticType::integer();
        let real = SemanticType::real();
        assert!(!int.is_compatible_with(&real));
        assert!(int.is_compatible_with(&SemanticType::unknown()));
        assert!(SemanticType::standard("Array").is_compatible_with(&SemanticType::array_of(&int)));
    }

    #[test]
    fn from_name_round_trips() {
        for ty in [
            SemanticType::integer(),
            SemanticType::list_of(&SemanticType::class("Point")),
            SemanticType::class("Main"),
        ] {
            assert_eq!(SemanticType::from_name(&ty.name), ty);
        }
    }
}
