// SPDX-License-Identifier: BSD-3-Clause
//! Static types. The constraint collector only ever asks whether a type is
//! a pointer, so aggregates keep just enough structure to print them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Type {
    #[default]
    Void,
    Integer {
        bits: u32,
    },
    Float,
    Pointer,
    Array {
        element: Box<Type>,
        len: usize,
    },
    Struct {
        elements: Vec<Type>,
    },
    Vector {
        element: Box<Type>,
        len: usize,
    },
    Function,
    Label,
    Token,
    Metadata,
    Other,
}

impl Type {
    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer)
    }

    /// Whether a value of this type holds a pointer anywhere inside it.
    pub fn contains_pointer(&self) -> bool {
        match self {
            Type::Pointer => true,
            Type::Array { element, .. } | Type::Vector { element, .. } => {
                element.contains_pointer()
            }
            Type::Struct { elements } => elements.iter().any(Type::contains_pointer),
            _ => false,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Integer { bits } => write!(f, "i{}", bits),
            Type::Float => write!(f, "double"),
            Type::Pointer => write!(f, "ptr"),
            Type::Array { element, len } => write!(f, "[{} x {}]", len, element),
            Type::Struct { elements } => write!(
                f,
                "{{ {} }}",
                elements
                    .iter()
                    .map(|t| format!("{}", t))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Type::Vector { element, len } => write!(f, "<{} x {}>", len, element),
            Type::Function => write!(f, "fn"),
            Type::Label => write!(f, "label"),
            Type::Token => write!(f, "token"),
            Type::Metadata => write!(f, "metadata"),
            Type::Other => write!(f, "<some type>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Type;

    #[test]
    fn only_pointers_are_pointers() {
        assert!(Type::Pointer.is_pointer());
        assert!(!Type::Integer { bits: 64 }.is_pointer());
        assert!(!Type::Vector {
            element: Box::new(Type::Pointer),
            len: 2
        }
        .is_pointer());
    }

    #[test]
    fn pointers_inside_aggregates() {
        let ty = Type::Struct {
            elements: vec![
                Type::Integer { bits: 32 },
                Type::Array {
                    element: Box::new(Type::Pointer),
                    len: 4,
                },
            ],
        };
        assert!(ty.contains_pointer());
        assert!(!Type::Array {
            element: Box::new(Type::Integer { bits: 8 }),
            len: 16
        }
        .contains_pointer());
    }

    #[test]
    fn deserializes_kebab_case() {
        let ty: Type = serde_json::from_str(r#"{"integer": {"bits": 32}}"#).unwrap();
        assert_eq!(Type::Integer { bits: 32 }, ty);
        let ty: Type = serde_json::from_str(r#""pointer""#).unwrap();
        assert_eq!(Type::Pointer, ty);
    }
}
