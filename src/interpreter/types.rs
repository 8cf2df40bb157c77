//==================================================
// File: types.rs
//==================================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Built-in type registry for the violet runtime
// Objective: Map type names to value variants for the type checker and scope
//==================================================

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::ast::TypeName;

use super::errors::RuntimeError;

/// Variant tag of a runtime value. Declared types, cast targets, and the
/// nominal checks at assignment/call boundaries all compare these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Void,
    Boolean,
    Integer,
    String,
    List,
    Function,
    Module,
    Native,
    Type,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Void => "Void",
            TypeTag::Boolean => "Boolean",
            TypeTag::Integer => "Integer",
            TypeTag::String => "String",
            TypeTag::List => "List",
            TypeTag::Function => "Function",
            TypeTag::Module => "Module",
            TypeTag::Native => "NativeCallable",
            TypeTag::Type => "Type",
        }
    }

    /// Primitive variants carry a comparable payload; the others do not.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeTag::Void | TypeTag::Boolean | TypeTag::Integer | TypeTag::String | TypeTag::List
        )
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// The only process-wide state in the engine; read-only after startup.
static BUILTIN_TYPES: Lazy<HashMap<&'static str, TypeTag>> = Lazy::new(|| {
    let mut types = HashMap::new();
    types.insert("Void", TypeTag::Void);
    types.insert("Boolean", TypeTag::Boolean);
    types.insert("Integer", TypeTag::Integer);
    types.insert("String", TypeTag::String);
    types.insert("List", TypeTag::List);
    types
});

/// Resolve a built-in type name. Type names occupy an implicit outermost
/// layer beneath every module's global scope.
pub fn resolve(name: &str) -> Option<TypeTag> {
    BUILTIN_TYPES.get(name).copied()
}

pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains_key(name)
}

/// Resolve a source-level annotation to its variant tag. Only the outer name
/// participates: `List[Integer]` resolves to `List`, the element name is
/// unchecked. An unknown name is the ordinary not-defined binding error.
pub fn resolve_annotation(annotation: &TypeName) -> Result<TypeTag, RuntimeError> {
    resolve(&annotation.name)
        .ok_or_else(|| RuntimeError::VariableNotFound(annotation.name.clone()))
}
