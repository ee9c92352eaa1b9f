// SPDX-License-Identifier: BSD-3-Clause
use serde::{Deserialize, Serialize};

use super::constant::Constant;
use super::name::LocalName;
use super::types::Type;

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operand {
    Constant(Constant),
    Local { name: LocalName, ty: Type },
    Metadata,
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Constant(c) => write!(f, "{}", c),
            Operand::Local { name, .. } => write!(f, "{}", name),
            Operand::Metadata => write!(f, "<metadata>"),
        }
    }
}

impl Operand {
    pub fn local(name: &str, ty: Type) -> Self {
        Operand::Local {
            name: LocalName::from(name),
            ty,
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Operand::Constant(c) => c.ty(),
            Operand::Local { ty, .. } => ty.clone(),
            Operand::Metadata => Type::Metadata,
        }
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.ty().is_pointer()
    }

    pub(crate) fn constant(&self) -> Option<&Constant> {
        match self {
            Operand::Constant(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Callee {
    Operand(Operand),
    Asm,
}

impl std::fmt::Display for Callee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callee::Operand(op) => write!(f, "{}", op),
            Callee::Asm => write!(f, "asm"),
        }
    }
}
