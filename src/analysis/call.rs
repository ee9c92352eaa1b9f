// SPDX-License-Identifier: BSD-3-Clause
//! Call sites
//!
//! Matching arguments to parameters, resolving indirect callees and
//! summarizing library functions is the job of a [`CallConstraints`]
//! implementation. The collector hands it every `call` and `invoke` along
//! with the shared node factory and constraint list.

use tracing::trace;

use crate::llvm::{Callee, FunctionName, LocalName, Operand, Type};

use super::constraint::{Constraint, Constraints};
use super::error::Error;
use super::node::{Entity, Node, NodeFactory};

/// A `call` instruction or `invoke` terminator.
#[derive(Clone, Copy, Debug)]
pub struct CallSite<'module> {
    /// The calling function
    pub function: &'module FunctionName,
    pub result: Option<&'module LocalName>,
    /// Return type of the call
    pub ty: &'module Type,
    pub callee: &'module Callee,
    pub args: &'module [Operand],
}

impl std::fmt::Display for CallSite<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(r) = self.result {
            write!(f, "{} = ", r)?;
        }
        write!(f, "call {}(", self.callee)?;
        for (i, a) in self.args.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", a)?;
        }
        write!(f, ") in {}", self.function)
    }
}

impl<'module> CallSite<'module> {
    /// Value node of the call's result. The registration pass creates it for
    /// every pointer-typed call.
    pub fn result_node(&self, nodes: &NodeFactory<'module>) -> Result<Node, Error> {
        self.result
            .and_then(|r| nodes.value_node(Entity::Local(self.function, r)))
            .ok_or_else(|| Error::MissingValueNode(self.to_string()))
    }

    pub fn arg_node(&self, nodes: &NodeFactory<'module>, idx: usize) -> Result<Node, Error> {
        self.args
            .get(idx)
            .and_then(|a| nodes.value_node_for_operand(self.function, a))
            .ok_or_else(|| Error::MissingValueNode(format!("argument {} of {}", idx, self)))
    }
}

/// Appends the constraints induced by a call site. Implementations must only
/// append to `constraints`, and must use `nodes` for every node they mention.
pub trait CallConstraints {
    fn collect<'module>(
        &mut self,
        site: &CallSite<'module>,
        nodes: &mut NodeFactory<'module>,
        constraints: &mut Constraints,
    ) -> Result<(), Error>;
}

/// Treats every callee as an unknown external function: the result may be
/// any pointer, pointer arguments escape into the universal object, and
/// anything reachable from them may be overwritten with unknown pointers.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueCalls;

impl CallConstraints for OpaqueCalls {
    fn collect<'module>(
        &mut self,
        site: &CallSite<'module>,
        nodes: &mut NodeFactory<'module>,
        constraints: &mut Constraints,
    ) -> Result<(), Error> {
        trace!(call = %site, "opaque call");
        if site.ty.is_pointer() {
            let result = site.result_node(nodes)?;
            constraints.push(Constraint::copy(result, Node::UNIVERSAL_PTR));
        }
        for (idx, arg) in site.args.iter().enumerate() {
            if !arg.is_pointer() {
                continue;
            }
            let a = site.arg_node(nodes, idx)?;
            constraints.push(Constraint::store(Node::UNIVERSAL_PTR, a));
            constraints.push(Constraint::store(a, Node::UNIVERSAL_PTR));
        }
        Ok(())
    }
}
