// SPDX-License-Identifier: BSD-3-Clause
//! Constraint collection
//!
//! Scans the module, adding a constraint for each instruction that induces
//! one. Per function there are two passes: the first creates a value node
//! for every pointer-typed instruction, the second translates instructions
//! into constraints. Phi nodes may name values defined later in the
//! function, so every value node has to exist before translation starts.
//!
//! Sources of unsoundness (logged, no constraints):
//!
//! - Pointer-typed `bitcast`, `inttoptr`, `select`, `va_arg`,
//!   `extractvalue` and `insertvalue`
//! - Exception handling (`landingpad`, `resume`)
//! - Atomics (`atomicrmw`, `cmpxchg`)

use std::fmt::Display;

use tracing::{debug, debug_span, warn};

use crate::llvm::instruction::{GetElementPtr, Load, Opcode, Phi, Store};
use crate::llvm::{
    Constant, Function, FunctionName, Instruction, Invoke, Module, Operand, Ret, Terminator,
    TerminatorOpcode,
};

use super::call::{CallConstraints, CallSite, OpaqueCalls};
use super::constraint::{Constraint, Constraints};
use super::error::Error;
use super::node::{Entity, Node, NodeFactory};

struct Collector<'module, 'a, C> {
    nodes: &'a mut NodeFactory<'module>,
    calls: &'a mut C,
    constraints: Constraints,
}

impl<'module, C: CallConstraints> Collector<'module, '_, C> {
    /// The universal pointer points to the universal object, which points to
    /// itself. The null pointer points to the null object.
    fn bootstrap(&mut self) {
        self.constraints
            .push(Constraint::addr_of(Node::UNIVERSAL_PTR, Node::UNIVERSAL_OBJ));
        self.constraints
            .push(Constraint::store(Node::UNIVERSAL_OBJ, Node::UNIVERSAL_OBJ));
        self.constraints
            .push(Constraint::addr_of(Node::NULL_PTR, Node::NULL_OBJ));
    }

    fn register_function(&mut self, f: &'module Function) -> Result<(), Error> {
        for b in &f.blocks {
            let results = b
                .instrs
                .iter()
                .map(|i| (&i.result, &i.ty))
                .chain(std::iter::once((&b.terminator.result, &b.terminator.ty)));
            for (result, ty) in results {
                if !ty.is_pointer() {
                    continue;
                }
                match result {
                    Some(r) => {
                        self.nodes.create_value_node(Entity::Local(&f.name, r))?;
                    }
                    None => {
                        return Err(Error::MissingValueNode(format!(
                            "unnamed pointer-typed instruction in {}",
                            f.name
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_function(&mut self, f: &'module Function) -> Result<(), Error> {
        for b in &f.blocks {
            for i in &b.instrs {
                self.collect_instruction(&f.name, i)?;
            }
            self.collect_terminator(&f.name, &b.terminator)?;
        }
        Ok(())
    }

    fn result_node(&self, f: &'module FunctionName, i: &'module Instruction) -> Result<Node, Error> {
        i.result
            .as_ref()
            .and_then(|r| self.nodes.value_node(Entity::Local(f, r)))
            .ok_or_else(|| Error::MissingValueNode(format!("{} in {}", i, f)))
    }

    fn operand_node(&self, f: &'module FunctionName, op: &'module Operand) -> Result<Node, Error> {
        self.nodes
            .value_node_for_operand(f, op)
            .ok_or_else(|| Error::MissingValueNode(format!("{} in {}", op, f)))
    }

    fn not_implemented(&self, f: &FunctionName, i: &dyn Display) {
        warn!(function = %f, instruction = %i, "not implemented yet");
    }

    fn collect_instruction(
        &mut self,
        f: &'module FunctionName,
        i: &'module Instruction,
    ) -> Result<(), Error> {
        match &i.opcode {
            Opcode::Alloca(_) => {
                let val = self.result_node(f, i)?;
                if let Some(r) = &i.result {
                    let obj = self.nodes.create_object_node(Entity::Local(f, r))?;
                    self.constraints.push(Constraint::addr_of(val, obj));
                }
            }

            Opcode::Call(c) => {
                let site = CallSite {
                    function: f,
                    result: i.result.as_ref(),
                    ty: &i.ty,
                    callee: &c.callee,
                    args: &c.args,
                };
                self.calls.collect(&site, self.nodes, &mut self.constraints)?;
            }

            Opcode::Load(Load { pointer }) => {
                if i.ty.is_pointer() {
                    let src = self.operand_node(f, pointer)?;
                    let dst = self.result_node(f, i)?;
                    self.constraints.push(Constraint::load(dst, src));
                }
            }

            Opcode::Store(Store { value, pointer }) => {
                if value.is_pointer() {
                    let src = self.operand_node(f, value)?;
                    let dst = self.operand_node(f, pointer)?;
                    self.constraints.push(Constraint::store(dst, src));
                }
            }

            // Field-insensitive: the result aliases its base
            Opcode::GetElementPtr(GetElementPtr { pointer, .. }) => {
                // Vector GEPs are not modeled; fatal rather than skipped
                if !i.ty.is_pointer() {
                    return Err(Error::UnhandledPointerInstruction(format!("{} in {}", i, f)));
                }
                let src = self.operand_node(f, pointer)?;
                let dst = self.result_node(f, i)?;
                self.constraints.push(Constraint::copy(dst, src));
            }

            Opcode::Phi(Phi { incoming }) => {
                if i.ty.is_pointer() {
                    let dst = self.result_node(f, i)?;
                    for (value, _block) in incoming {
                        let src = self.operand_node(f, value)?;
                        self.constraints.push(Constraint::copy(dst, src));
                    }
                }
            }

            Opcode::BitCast(_)
            | Opcode::IntToPtr(_)
            | Opcode::Select(_)
            | Opcode::VaArg(_)
            | Opcode::ExtractValue(_)
            | Opcode::InsertValue(_) => {
                if i.ty.is_pointer() {
                    self.not_implemented(f, i);
                }
            }

            Opcode::LandingPad | Opcode::AtomicRmw(_) | Opcode::CmpXchg(_) => {
                self.not_implemented(f, i);
            }

            // No `_` pattern to ensure this is updated if the type changes
            Opcode::Add(_)
            | Opcode::Icmp(_)
            | Opcode::PtrToInt(_)
            | Opcode::Sub(_)
            | Opcode::Other { .. } => {
                if i.ty.is_pointer() {
                    return Err(Error::UnhandledPointerInstruction(format!("{} in {}", i, f)));
                }
            }
        }
        Ok(())
    }

    fn collect_terminator(
        &mut self,
        f: &'module FunctionName,
        t: &'module Terminator,
    ) -> Result<(), Error> {
        match &t.opcode {
            TerminatorOpcode::Invoke(Invoke { callee, args, .. }) => {
                let site = CallSite {
                    function: f,
                    result: t.result.as_ref(),
                    ty: &t.ty,
                    callee,
                    args,
                };
                self.calls.collect(&site, self.nodes, &mut self.constraints)?;
            }

            TerminatorOpcode::Ret(Ret { operand: Some(op) }) if op.is_pointer() => {
                let ret = self
                    .nodes
                    .return_node(f)
                    .ok_or_else(|| Error::MissingReturnNode(f.to_string()))?;
                let val = self.operand_node(f, op)?;
                self.constraints.push(Constraint::copy(ret, val));
            }
            TerminatorOpcode::Ret(_) => (),

            TerminatorOpcode::Resume(_) => self.not_implemented(f, t),

            TerminatorOpcode::Other { .. } => {
                if t.ty.is_pointer() {
                    return Err(Error::UnhandledPointerInstruction(format!("{} in {}", t, f)));
                }
            }
        }
        Ok(())
    }

    /// Functions and globals point to their own objects. Initializers are
    /// field-insensitive: every pointer anywhere in the initializer is
    /// something the global's object points to.
    fn collect_globals(&mut self, module: &'module Module) -> Result<(), Error> {
        for f in module.functions.iter().filter(|f| !f.is_intrinsic()) {
            self.collect_address_taken(Entity::Function(&f.name))?;
        }
        for g in &module.globals {
            let obj = self.collect_address_taken(Entity::Global(&g.name))?;
            if let Some(init) = &g.initializer {
                self.collect_initializer(obj, init)?;
            }
        }
        Ok(())
    }

    fn collect_address_taken(&mut self, e: Entity<'module>) -> Result<Node, Error> {
        let val = self
            .nodes
            .value_node(e)
            .ok_or_else(|| Error::MissingValueNode(e.to_string()))?;
        let obj = self
            .nodes
            .object_node(e)
            .ok_or_else(|| Error::MissingObjectNode(e.to_string()))?;
        self.constraints.push(Constraint::addr_of(val, obj));
        Ok(obj)
    }

    fn collect_initializer(&mut self, obj: Node, c: &'module Constant) -> Result<(), Error> {
        match c {
            Constant::Undef(_) => (),
            Constant::AggregateZero(ty) => {
                if ty.contains_pointer() {
                    self.constraints.push(Constraint::addr_of(obj, Node::NULL_OBJ));
                }
            }
            Constant::Array(cs) | Constant::Struct(cs) => {
                for c in cs {
                    self.collect_initializer(obj, c)?;
                }
            }
            c if c.ty().is_pointer() => {
                let pointee = self
                    .nodes
                    .object_node_for_constant(c)
                    .ok_or_else(|| Error::MissingObjectNode(c.to_string()))?;
                self.constraints.push(Constraint::addr_of(obj, pointee));
            }
            _ => (),
        }
        Ok(())
    }
}

/// Collect the constraints for `module`.
///
/// `nodes` must already hold the module-level entities (see
/// [`NodeFactory::new`]); `calls` handles every call site. The first three
/// constraints are always the universal and null bootstrap. On error,
/// collection stops and nothing is returned.
pub fn collect<'module, C: CallConstraints>(
    module: &'module Module,
    nodes: &mut NodeFactory<'module>,
    calls: &mut C,
) -> Result<Constraints, Error> {
    let mut collector = Collector {
        nodes,
        calls,
        constraints: Constraints::default(),
    };
    collector.bootstrap();

    for f in &module.functions {
        if f.is_declaration() || f.is_intrinsic() {
            continue;
        }
        let span = debug_span!("collect", function = %f.name);
        let _span = span.enter();
        let before = collector.constraints.len();
        collector.register_function(f)?;
        collector.collect_function(f)?;
        debug!(constraints = collector.constraints.len() - before, "collected");
    }

    collector.collect_globals(module)?;
    Ok(collector.constraints)
}

/// [`collect`] with a fresh node factory and [`OpaqueCalls`].
pub fn collect_constraints(
    module: &Module,
) -> Result<(NodeFactory<'_>, Constraints), Error> {
    let mut nodes = NodeFactory::new(module)?;
    let constraints = collect(module, &mut nodes, &mut OpaqueCalls)?;
    Ok((nodes, constraints))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::analysis::Error;
    use crate::llvm::Module;

    use super::collect_constraints;

    fn function(instr: serde_json::Value) -> Module {
        Module::from_json(
            &json!({
                "functions": [{
                    "name": "f",
                    "parameters": [{ "name": "p", "ty": "pointer" }],
                    "blocks": [{
                        "name": "entry",
                        "instrs": [instr],
                        "terminator": { "opcode": { "ret": {} } }
                    }]
                }]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn gep_must_be_pointer_typed() {
        let m = function(json!({
            "result": "g",
            "ty": { "vector": { "element": "pointer", "len": 2 } },
            "opcode": { "get-element-ptr": {
                "pointer": { "local": { "name": "p", "ty": "pointer" } }
            } }
        }));
        let err = collect_constraints(&m).unwrap_err();
        assert!(matches!(err, Error::UnhandledPointerInstruction(_)), "{}", err);
    }

    #[test]
    fn integer_arithmetic_is_ignored() {
        let m = function(json!({
            "result": "x",
            "ty": { "integer": { "bits": 64 } },
            "opcode": { "ptr-to-int": {
                "pointer": { "local": { "name": "p", "ty": "pointer" } }
            } }
        }));
        let (_nodes, cs) = collect_constraints(&m).unwrap();
        // Bootstrap and the address of @f
        assert_eq!(4, cs.len());
    }
}
