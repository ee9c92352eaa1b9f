// SPDX-License-Identifier: BSD-3-Clause
//! Node identities for the constraint graph.
//!
//! A [`Node`] is either a *value node* (a program value that holds a
//! pointer) or an *object node* (a memory location that can be pointed to).
//! Four nodes are reserved and exist before anything else is registered:
//! the universal pointer/object, modeling "anything unknown", and the null
//! pointer/object.

use std::fmt::Display;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::llvm::{Constant, FunctionName, GlobalName, LocalName, Module, Operand};

use super::error::Error;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Node(u32);

impl Node {
    pub const UNIVERSAL_PTR: Node = Node(0);
    pub const UNIVERSAL_OBJ: Node = Node(1);
    pub const NULL_PTR: Node = Node(2);
    pub const NULL_OBJ: Node = Node(3);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A program entity that can own a value or object node.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Entity<'module> {
    /// A parameter or instruction result of the given function
    Local(&'module FunctionName, &'module LocalName),
    Global(&'module GlobalName),
    Function(&'module FunctionName),
}

impl Display for Entity<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Local(func, local) => write!(f, "{}:{}", func, local),
            Entity::Global(g) => write!(f, "{}", g),
            Entity::Function(func) => write!(f, "{}", func),
        }
    }
}

/// What a node stands for, for printing the node table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind<'module> {
    UniversalPtr,
    UniversalObj,
    NullPtr,
    NullObj,
    Value(Entity<'module>),
    Object(Entity<'module>),
    Return(&'module FunctionName),
    Vararg(&'module FunctionName),
}

impl Display for NodeKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::UniversalPtr => write!(f, "<universal ptr>"),
            NodeKind::UniversalObj => write!(f, "<universal obj>"),
            NodeKind::NullPtr => write!(f, "<null ptr>"),
            NodeKind::NullObj => write!(f, "<null obj>"),
            NodeKind::Value(e) => write!(f, "{}", e),
            NodeKind::Object(e) => write!(f, "*{}", e),
            NodeKind::Return(func) => write!(f, "<return of {}>", func),
            NodeKind::Vararg(func) => write!(f, "<varargs of {}>", func),
        }
    }
}

/// Allocates nodes and maps program entities to them.
///
/// Owned by one analysis run; identities are dense indices into `nodes` and
/// are never reused.
#[derive(Debug)]
pub struct NodeFactory<'module> {
    nodes: Vec<NodeKind<'module>>,
    values: FxHashMap<Entity<'module>, Node>,
    objects: FxHashMap<Entity<'module>, Node>,
    returns: FxHashMap<&'module FunctionName, Node>,
    varargs: FxHashMap<&'module FunctionName, Node>,
}

impl<'module> Default for NodeFactory<'module> {
    fn default() -> Self {
        NodeFactory {
            nodes: vec![
                NodeKind::UniversalPtr,
                NodeKind::UniversalObj,
                NodeKind::NullPtr,
                NodeKind::NullObj,
            ],
            values: FxHashMap::default(),
            objects: FxHashMap::default(),
            returns: FxHashMap::default(),
            varargs: FxHashMap::default(),
        }
    }
}

impl<'module> NodeFactory<'module> {
    /// A factory with the reserved nodes plus the module-level entities:
    /// value and object nodes for globals and functions, return and vararg
    /// nodes, and value nodes for pointer-typed parameters of definitions.
    /// Intrinsics are skipped, their address can't be taken.
    pub fn new(module: &'module Module) -> Result<Self, Error> {
        let mut nodes = Self::default();
        for g in &module.globals {
            nodes.create_value_node(Entity::Global(&g.name))?;
            nodes.create_object_node(Entity::Global(&g.name))?;
        }
        for f in module.functions.iter().filter(|f| !f.is_intrinsic()) {
            nodes.create_value_node(Entity::Function(&f.name))?;
            nodes.create_object_node(Entity::Function(&f.name))?;
            if f.return_type.is_pointer() {
                let n = nodes.push(NodeKind::Return(&f.name))?;
                nodes.returns.insert(&f.name, n);
            }
            if f.is_var_arg {
                let n = nodes.push(NodeKind::Vararg(&f.name))?;
                nodes.varargs.insert(&f.name, n);
            }
            if !f.is_declaration() {
                for p in f.parameters.iter().filter(|p| p.ty.is_pointer()) {
                    nodes.create_value_node(Entity::Local(&f.name, &p.name))?;
                }
            }
        }
        Ok(nodes)
    }

    fn push(&mut self, kind: NodeKind<'module>) -> Result<Node, Error> {
        let idx = u32::try_from(self.nodes.len()).map_err(|_| Error::NodeLimit)?;
        self.nodes.push(kind);
        Ok(Node(idx))
    }

    /// Idempotent: returns the existing node if `entity` already has one.
    pub fn create_value_node(&mut self, entity: Entity<'module>) -> Result<Node, Error> {
        if let Some(n) = self.values.get(&entity) {
            return Ok(*n);
        }
        let n = self.push(NodeKind::Value(entity))?;
        self.values.insert(entity, n);
        Ok(n)
    }

    /// Idempotent: returns the existing node if `entity` already has one.
    pub fn create_object_node(&mut self, entity: Entity<'module>) -> Result<Node, Error> {
        if let Some(n) = self.objects.get(&entity) {
            return Ok(*n);
        }
        let n = self.push(NodeKind::Object(entity))?;
        self.objects.insert(entity, n);
        Ok(n)
    }

    pub fn value_node(&self, entity: Entity<'module>) -> Option<Node> {
        self.values.get(&entity).copied()
    }

    pub fn object_node(&self, entity: Entity<'module>) -> Option<Node> {
        self.objects.get(&entity).copied()
    }

    pub fn return_node(&self, function: &FunctionName) -> Option<Node> {
        self.returns.get(function).copied()
    }

    pub fn vararg_node(&self, function: &FunctionName) -> Option<Node> {
        self.varargs.get(function).copied()
    }

    /// Value node for an operand used inside `function`.
    ///
    /// `null` and `undef` are the null pointer, address computations and
    /// casts of constants alias their base, and integer-to-pointer casts
    /// could be anything.
    pub fn value_node_for_operand(
        &self,
        function: &'module FunctionName,
        op: &'module Operand,
    ) -> Option<Node> {
        match op {
            Operand::Local { name, .. } => self.value_node(Entity::Local(function, name)),
            Operand::Constant(c) => self.value_node_for_constant(c),
            Operand::Metadata => None,
        }
    }

    pub fn value_node_for_constant(&self, c: &'module Constant) -> Option<Node> {
        match c {
            Constant::Null | Constant::Undef(_) => Some(Node::NULL_PTR),
            Constant::Global(g) => self.value_node(Entity::Global(g)),
            Constant::Function(f) => self.value_node(Entity::Function(f)),
            Constant::GetElementPtr(base) | Constant::BitCast(base) => {
                self.value_node_for_constant(base)
            }
            Constant::IntToPtr(_) | Constant::PtrToInt(_) => Some(Node::UNIVERSAL_PTR),
            Constant::Int { .. }
            | Constant::AggregateZero(_)
            | Constant::Array(_)
            | Constant::Struct(_)
            | Constant::Other(_) => None,
        }
    }

    /// The object a constant pointer points to.
    pub fn object_node_for_constant(&self, c: &'module Constant) -> Option<Node> {
        match c {
            Constant::Null | Constant::Undef(_) => Some(Node::NULL_OBJ),
            Constant::Global(g) => self.object_node(Entity::Global(g)),
            Constant::Function(f) => self.object_node(Entity::Function(f)),
            Constant::GetElementPtr(base) | Constant::BitCast(base) => {
                self.object_node_for_constant(base)
            }
            Constant::IntToPtr(_) => Some(Node::UNIVERSAL_OBJ),
            Constant::PtrToInt(_)
            | Constant::Int { .. }
            | Constant::AggregateZero(_)
            | Constant::Array(_)
            | Constant::Struct(_)
            | Constant::Other(_) => None,
        }
    }

    pub fn kind(&self, n: Node) -> Option<NodeKind<'module>> {
        self.nodes.get(n.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Node, NodeKind<'module>)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, k)| (Node(i as u32), *k))
    }
}
