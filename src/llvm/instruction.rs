// SPDX-License-Identifier: BSD-3-Clause
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::name::{BlockName, LocalName};
use super::operand::{Callee, Operand};
use super::types::Type;

fn join(ops: &[Operand]) -> String {
    ops.iter()
        .map(|o| format!("{}", o))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Add {
    pub operand0: Operand,
    pub operand1: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Alloca {
    pub allocated_type: Type,
    #[serde(default = "Alloca::one")]
    pub num_elements: Operand,
}

impl Alloca {
    fn one() -> Operand {
        Operand::Constant(super::Constant::Int { bits: 32, value: 1 })
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicRmw {
    pub pointer: Operand,
    pub value: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitCast {
    pub operand: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Callee,
    #[serde(default)]
    pub args: Vec<Operand>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmpXchg {
    pub pointer: Operand,
    pub expected: Operand,
    pub replacement: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractValue {
    pub aggregate: Operand,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetElementPtr {
    pub pointer: Operand,
    #[serde(default)]
    pub indices: Vec<Operand>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icmp {
    pub operand0: Operand,
    pub operand1: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertValue {
    pub aggregate: Operand,
    pub element: Operand,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntToPtr {
    pub int: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Load {
    pub pointer: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phi {
    pub incoming: Vec<(Operand, BlockName)>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtrToInt {
    pub pointer: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Select {
    pub condition: Operand,
    pub true_value: Operand,
    pub false_value: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub value: Operand,
    pub pointer: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sub {
    pub minuend: Operand,
    pub subtrahend: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaArg {
    pub list: Operand,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Opcode {
    Add(Add),
    Alloca(Alloca),
    AtomicRmw(AtomicRmw),
    BitCast(BitCast),
    Call(Call),
    CmpXchg(CmpXchg),
    ExtractValue(ExtractValue),
    GetElementPtr(GetElementPtr),
    Icmp(Icmp),
    InsertValue(InsertValue),
    IntToPtr(IntToPtr),
    LandingPad,
    Load(Load),
    Phi(Phi),
    PtrToInt(PtrToInt),
    Select(Select),
    Store(Store),
    Sub(Sub),
    VaArg(VaArg),
    /// Any opcode without pointer semantics of its own, e.g. `fadd`.
    Other {
        opcode: String,
        #[serde(default)]
        operands: Vec<Operand>,
    },
}

impl Opcode {
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Opcode::Add(a) => vec![&a.operand0, &a.operand1],
            Opcode::Alloca(a) => vec![&a.num_elements],
            Opcode::AtomicRmw(a) => vec![&a.pointer, &a.value],
            Opcode::BitCast(b) => vec![&b.operand],
            Opcode::Call(c) => {
                let mut os = match &c.callee {
                    Callee::Asm => vec![],
                    Callee::Operand(op) => vec![op],
                };
                os.extend(c.args.iter());
                os
            }
            Opcode::CmpXchg(c) => vec![&c.pointer, &c.expected, &c.replacement],
            Opcode::ExtractValue(e) => vec![&e.aggregate],
            Opcode::GetElementPtr(g) => {
                let mut ops = vec![&g.pointer];
                ops.extend(g.indices.iter());
                ops
            }
            Opcode::Icmp(i) => vec![&i.operand0, &i.operand1],
            Opcode::InsertValue(i) => vec![&i.aggregate, &i.element],
            Opcode::IntToPtr(i) => vec![&i.int],
            Opcode::LandingPad => vec![],
            Opcode::Load(l) => vec![&l.pointer],
            Opcode::Phi(p) => p.incoming.iter().map(|(op, _)| op).collect(),
            Opcode::PtrToInt(p) => vec![&p.pointer],
            Opcode::Select(s) => vec![&s.condition, &s.true_value, &s.false_value],
            Opcode::Store(s) => vec![&s.value, &s.pointer],
            Opcode::Sub(s) => vec![&s.minuend, &s.subtrahend],
            Opcode::VaArg(v) => vec![&v.list],
            Opcode::Other { operands, .. } => operands.iter().collect(),
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::Add(a) => write!(f, "add {}, {}", a.operand0, a.operand1),
            Opcode::Alloca(a) => write!(f, "alloca {}, {}", a.allocated_type, a.num_elements),
            Opcode::AtomicRmw(a) => write!(f, "atomicrmw {}, {}", a.pointer, a.value),
            Opcode::BitCast(b) => write!(f, "bitcast {}", b.operand),
            Opcode::Call(c) => write!(f, "call {}({})", c.callee, join(&c.args)),
            Opcode::CmpXchg(c) => write!(
                f,
                "cmpxchg {}, {}, {}",
                c.pointer, c.expected, c.replacement
            ),
            Opcode::ExtractValue(e) => write!(f, "extractvalue {}, {:?}", e.aggregate, e.indices),
            Opcode::GetElementPtr(g) => write!(f, "getelementptr {}, {}", g.pointer, join(&g.indices)),
            Opcode::Icmp(i) => write!(f, "icmp {}, {}", i.operand0, i.operand1),
            Opcode::InsertValue(i) => write!(
                f,
                "insertvalue {}, {}, {:?}",
                i.aggregate, i.element, i.indices
            ),
            Opcode::IntToPtr(i) => write!(f, "inttoptr {}", i.int),
            Opcode::LandingPad => write!(f, "landingpad"),
            Opcode::Load(l) => write!(f, "load {}", l.pointer),
            Opcode::Phi(p) => write!(
                f,
                "phi {}",
                p.incoming
                    .iter()
                    .map(|(op, b)| format!("[ {}, {} ]", op, b))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Opcode::PtrToInt(p) => write!(f, "ptrtoint {}", p.pointer),
            Opcode::Select(s) => write!(
                f,
                "select {}, {}, {}",
                s.condition, s.true_value, s.false_value
            ),
            Opcode::Store(s) => write!(f, "store {}, {}", s.value, s.pointer),
            Opcode::Sub(s) => write!(f, "sub {}, {}", s.minuend, s.subtrahend),
            Opcode::VaArg(v) => write!(f, "va_arg {}", v.list),
            Opcode::Other { opcode, operands } => {
                write!(f, "{}", opcode)?;
                if !operands.is_empty() {
                    write!(f, " {}", join(operands))?;
                }
                Ok(())
            }
        }
    }
}
