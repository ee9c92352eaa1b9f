// SPDX-License-Identifier: BSD-3-Clause
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::name::BlockName;
use super::operand::{Callee, Operand};

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Invoke {
    pub callee: Callee,
    #[serde(default)]
    pub args: Vec<Operand>,
    pub return_label: BlockName,
    pub exception_label: BlockName,
}

impl Invoke {
    pub(crate) fn operands(&self) -> Vec<&Operand> {
        let mut v: Vec<&Operand> = self.args.iter().collect();
        match &self.callee {
            Callee::Operand(o) => v.push(o),
            Callee::Asm => (),
        };
        v
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ret {
    #[serde(default)]
    pub operand: Option<Operand>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub operand: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminatorOpcode {
    Invoke(Invoke),
    Resume(Resume),
    Ret(Ret),
    /// Control flow without pointer semantics: `br`, `switch`, `unreachable`...
    Other {
        opcode: String,
        #[serde(default)]
        operands: Vec<Operand>,
    },
}

impl TerminatorOpcode {
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            TerminatorOpcode::Invoke(t) => t.operands(),
            TerminatorOpcode::Resume(r) => vec![&r.operand],
            TerminatorOpcode::Ret(t) => t.operand.iter().collect(),
            TerminatorOpcode::Other { operands, .. } => operands.iter().collect(),
        }
    }
}

impl Display for TerminatorOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminatorOpcode::Invoke(i) => write!(
                f,
                "invoke {}({}) to label {} unwind label {}",
                i.callee,
                i.args
                    .iter()
                    .map(|o| format!("{}", o))
                    .collect::<Vec<_>>()
                    .join(", "),
                i.return_label,
                i.exception_label
            ),
            TerminatorOpcode::Resume(r) => write!(f, "resume {}", r.operand),
            TerminatorOpcode::Ret(Ret { operand: Some(o) }) => write!(f, "ret {}", o),
            TerminatorOpcode::Ret(Ret { operand: None }) => write!(f, "ret void"),
            TerminatorOpcode::Other { opcode, operands } => {
                write!(f, "{}", opcode)?;
                for (i, o) in operands.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { " " } else { ", " }, o)?;
                }
                Ok(())
            }
        }
    }
}
