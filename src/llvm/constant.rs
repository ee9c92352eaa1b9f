// SPDX-License-Identifier: BSD-3-Clause
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::name::{FunctionName, GlobalName};
use super::types::Type;

/// Constants that can appear as operands or global initializers.
///
/// Constant expressions are modeled only as far as they matter for pointer
/// values: address computations and casts keep their operand, everything
/// else is [`Constant::Other`].
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Constant {
    Function(FunctionName),
    Global(GlobalName),
    Int { bits: u32, value: u64 },
    Null,
    Undef(Type),
    /// `zeroinitializer`
    AggregateZero(Type),
    // Expressions
    GetElementPtr(Box<Constant>),
    BitCast(Box<Constant>),
    IntToPtr(Box<Constant>),
    PtrToInt(Box<Constant>),
    //
    Array(Vec<Constant>),
    Struct(Vec<Constant>),
    //
    Other(Type),
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Function(_) => Type::Pointer,
            Constant::Global(_) => Type::Pointer,
            Constant::Int { bits, .. } => Type::Integer { bits: *bits },
            Constant::Null => Type::Pointer,
            Constant::Undef(ty) => ty.clone(),
            Constant::AggregateZero(ty) => ty.clone(),
            Constant::GetElementPtr(_) => Type::Pointer,
            Constant::BitCast(c) => c.ty(),
            Constant::IntToPtr(_) => Type::Pointer,
            Constant::PtrToInt(_) => Type::Integer { bits: 64 },
            Constant::Array(elems) => Type::Array {
                element: Box::new(elems.first().map(Constant::ty).unwrap_or(Type::Other)),
                len: elems.len(),
            },
            Constant::Struct(fields) => Type::Struct {
                elements: fields.iter().map(Constant::ty).collect(),
            },
            Constant::Other(ty) => ty.clone(),
        }
    }

    /// Constants nested directly inside this one.
    pub(crate) fn children(&self) -> Vec<&Constant> {
        match self {
            Constant::GetElementPtr(c)
            | Constant::BitCast(c)
            | Constant::IntToPtr(c)
            | Constant::PtrToInt(c) => vec![&**c],
            Constant::Array(cs) | Constant::Struct(cs) => cs.iter().collect(),
            // No `_` pattern to ensure this is updated if the type changes
            Constant::Function(_) => vec![],
            Constant::Global(_) => vec![],
            Constant::Int { .. } => vec![],
            Constant::Null => vec![],
            Constant::Undef(_) => vec![],
            Constant::AggregateZero(_) => vec![],
            Constant::Other(_) => vec![],
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Function(func) => write!(f, "{}", func),
            Constant::Global(g) => write!(f, "{}", g),
            Constant::Int { value, bits } => write!(f, "i{} {}", bits, value),
            Constant::Null => write!(f, "null"),
            Constant::Undef(_) => write!(f, "undef"),
            Constant::AggregateZero(_) => write!(f, "zeroinitializer"),
            Constant::GetElementPtr(c) => write!(f, "getelementptr({})", c),
            Constant::BitCast(c) => write!(f, "bitcast({})", c),
            Constant::IntToPtr(c) => write!(f, "inttoptr({})", c),
            Constant::PtrToInt(c) => write!(f, "ptrtoint({})", c),
            Constant::Array(a) => write!(
                f,
                "[ {} ]",
                a.iter()
                    .map(|c| format!("{}", c))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Constant::Struct(s) => write!(
                f,
                "{{ {} }}",
                s.iter()
                    .map(|c| format!("{}", c))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Constant::Other(_) => write!(f, "<some constant>"),
        }
    }
}
