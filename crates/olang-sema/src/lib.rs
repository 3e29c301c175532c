//! O semantic analysis: name resolution, inheritance, overloads, type
//! checking, usage-driven cleanup, and the read-only semantic model.

pub mod analyzer;
pub mod errors;
pub mod model;
pub mod registry;
pub mod scope;
pub mod types;

pub use analyzer::{Analyzer, TypeError};
pub use errors::SemanticError;
pub use model::{SemanticClass, SemanticCtor, SemanticField, SemanticMethod, SemanticModel};
pub use registry::{ClassId, CtorId, EntityRegistry, MethodId, VarId, VarKind};
pub use types::{SemanticType, TypeKind};
