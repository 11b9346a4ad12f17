//! Owned representation of WDL input types
//!
//! Syntax trees produced by `wdl-ast` are reference counted and tied to the
//! parse; declared input types are copied out into [`WdlType`] so they can
//! outlive the parse and cross `.await` points.

use std::fmt;

use wdl_ast::v1::{PrimitiveType, PrimitiveTypeKind, Type};
use wdl_ast::AstToken;

/// A WDL type together with its optional (`?`) qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WdlType {
    pub kind: TypeKind,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Boolean,
    Int,
    Float,
    String,
    File,
    Directory,
    Array {
        item: Box<WdlType>,
        non_empty: bool,
    },
    Map {
        key: Box<WdlType>,
        value: Box<WdlType>,
    },
    Pair {
        left: Box<WdlType>,
        right: Box<WdlType>,
    },
    Object,
    Struct(String),
}

impl WdlType {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub fn optional(kind: TypeKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }

    pub fn array(item: WdlType) -> Self {
        Self::new(TypeKind::Array {
            item: Box::new(item),
            non_empty: false,
        })
    }

    /// Whether the type accepts a string on the command line without JSON
    /// decoding.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Boolean
                | TypeKind::Int
                | TypeKind::Float
                | TypeKind::String
                | TypeKind::File
                | TypeKind::Directory
        )
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    pub(crate) fn from_ast(ty: &Type) -> Self {
        let optional = ty.is_optional();
        let kind = match ty {
            Type::Primitive(p) => return Self::from_primitive(p),
            Type::Array(a) => TypeKind::Array {
                item: Box::new(Self::from_ast(&a.element_type())),
                non_empty: a.is_non_empty(),
            },
            Type::Map(m) => {
                let (key, value) = m.types();
                TypeKind::Map {
                    key: Box::new(Self::from_primitive(&key)),
                    value: Box::new(Self::from_ast(&value)),
                }
            }
            Type::Pair(p) => {
                let (left, right) = p.types();
                TypeKind::Pair {
                    left: Box::new(Self::from_ast(&left)),
                    right: Box::new(Self::from_ast(&right)),
                }
            }
            Type::Object(_) => TypeKind::Object,
            Type::Ref(r) => TypeKind::Struct(r.name().text().to_string()),
        };
        Self { kind, optional }
    }

    fn from_primitive(p: &PrimitiveType) -> Self {
        let kind = match p.kind() {
            PrimitiveTypeKind::Boolean => TypeKind::Boolean,
            PrimitiveTypeKind::Integer => TypeKind::Int,
            PrimitiveTypeKind::Float => TypeKind::Float,
            PrimitiveTypeKind::String => TypeKind::String,
            PrimitiveTypeKind::File => TypeKind::File,
            PrimitiveTypeKind::Directory => TypeKind::Directory,
        };
        Self {
            kind,
            optional: p.is_optional(),
        }
    }
}

impl fmt::Display for WdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Boolean => write!(f, "Boolean")?,
            TypeKind::Int => write!(f, "Int")?,
            TypeKind::Float => write!(f, "Float")?,
            TypeKind::String => write!(f, "String")?,
            TypeKind::File => write!(f, "File")?,
            TypeKind::Directory => write!(f, "Directory")?,
            TypeKind::Array { item, non_empty } => {
                write!(f, "Array[{item}]")?;
                if *non_empty {
                    write!(f, "+")?;
                }
            }
            TypeKind::Map { key, value } => write!(f, "Map[{key}, {value}]")?,
            TypeKind::Pair { left, right } => write!(f, "Pair[{left}, {right}]")?,
            TypeKind::Object => write!(f, "Object")?,
            TypeKind::Struct(name) => write!(f, "{name}")?,
        }

        if self.optional {
            write!(f, "?")
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_types() {
        let ty = WdlType::optional(TypeKind::Map {
            key: Box::new(WdlType::new(TypeKind::String)),
            value: Box::new(WdlType::new(TypeKind::Array {
                item: Box::new(WdlType::optional(TypeKind::File)),
                non_empty: true,
            })),
        });
        assert_eq!(ty.to_string(), "Map[String, Array[File?]+]?");
    }

    #[test]
    fn test_scalar_classification() {
        assert!(WdlType::new(TypeKind::File).is_scalar());
        assert!(!WdlType::array(WdlType::new(TypeKind::Int)).is_scalar());
        assert!(!WdlType::new(TypeKind::Struct("Sample".into())).is_scalar());
    }
}
