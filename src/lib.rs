// SPDX-License-Identifier: BSD-3-Clause
pub mod analysis;
pub mod llvm;

pub use analysis::{
    collect, collect_constraints, CallConstraints, CallSite, Constraint, ConstraintKind,
    Constraints, Entity, Node, NodeFactory, NodeKind, OpaqueCalls,
};
pub use llvm::{FunctionName, GlobalName, LocalName, Module, Operand, Type};
