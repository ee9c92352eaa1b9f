// SPDX-License-Identifier: BSD-3-Clause
//! Conversion from `llvm_ir` (LLVM bitcode) to [`Module`].

use std::collections::HashSet;
use std::path::Path;

use either::Either;
use llvm_ir::types::{Typed, Types};

use super::instruction::{
    Add, Alloca, AtomicRmw, BitCast, Call, CmpXchg, ExtractValue, GetElementPtr, Icmp,
    InsertValue, IntToPtr, Load, Opcode, Phi, PtrToInt, Select, Store, Sub, VaArg,
};
use super::{
    Block, BlockName, Callee, Constant, Error, Function, FunctionName, Global, GlobalName,
    Instruction, Invoke, LocalName, Module, Operand, Parameter, Resume, Ret, Terminator,
    TerminatorOpcode, Type,
};

fn name(n: &llvm_ir::Name) -> String {
    match n {
        llvm_ir::Name::Name(n) => (**n).clone(),
        llvm_ir::Name::Number(n) => n.to_string(),
    }
}

/// `Debug` of an instruction starts with its variant name, e.g. `FAdd(...)`.
fn opcode_name<T: std::fmt::Debug>(i: &T) -> String {
    let s = format!("{:?}", i);
    s.split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("unknown")
        .to_lowercase()
}

fn convert_type(ty: &llvm_ir::Type) -> Type {
    match ty {
        llvm_ir::Type::VoidType => Type::Void,
        llvm_ir::Type::IntegerType { bits } => Type::Integer { bits: *bits },
        llvm_ir::Type::FPType(_) => Type::Float,
        llvm_ir::Type::PointerType { .. } => Type::Pointer,
        llvm_ir::Type::ArrayType {
            element_type,
            num_elements,
        } => Type::Array {
            element: Box::new(convert_type(element_type)),
            len: *num_elements,
        },
        llvm_ir::Type::StructType { element_types, .. } => Type::Struct {
            elements: element_types.iter().map(|t| convert_type(t)).collect(),
        },
        // Named struct bodies are not needed to decide pointer-ness
        llvm_ir::Type::NamedStructType { .. } => Type::Struct { elements: vec![] },
        llvm_ir::Type::VectorType {
            element_type,
            num_elements,
            ..
        } => Type::Vector {
            element: Box::new(convert_type(element_type)),
            len: *num_elements,
        },
        llvm_ir::Type::FuncType { .. } => Type::Function,
        llvm_ir::Type::LabelType => Type::Label,
        llvm_ir::Type::TokenType => Type::Token,
        llvm_ir::Type::MetadataType => Type::Metadata,
        llvm_ir::Type::X86_MMXType => Type::Other,
        llvm_ir::Type::X86_AMXType => Type::Other,
    }
}

struct Converter<'module> {
    types: &'module Types,
    functions: HashSet<&'module str>,
}

impl<'module> Converter<'module> {
    fn constant(&self, c: &llvm_ir::Constant) -> Constant {
        match c {
            llvm_ir::Constant::GlobalReference { name, .. } => {
                let name: &str = name.as_ref();
                if self.functions.contains(name) {
                    Constant::Function(FunctionName::from(name))
                } else {
                    Constant::Global(GlobalName::from(name))
                }
            }
            llvm_ir::Constant::Int { value, bits } => Constant::Int {
                value: *value,
                bits: *bits,
            },
            llvm_ir::Constant::Null(_) => Constant::Null,
            llvm_ir::Constant::Undef(ty) => Constant::Undef(convert_type(ty)),
            llvm_ir::Constant::Poison(ty) => Constant::Undef(convert_type(ty)),
            llvm_ir::Constant::AggregateZero(ty) => Constant::AggregateZero(convert_type(ty)),
            llvm_ir::Constant::GetElementPtr(g) => {
                Constant::GetElementPtr(Box::new(self.constant(&g.address)))
            }
            llvm_ir::Constant::BitCast(b) => Constant::BitCast(Box::new(self.constant(&b.operand))),
            llvm_ir::Constant::IntToPtr(i) => {
                Constant::IntToPtr(Box::new(self.constant(&i.operand)))
            }
            llvm_ir::Constant::PtrToInt(p) => {
                Constant::PtrToInt(Box::new(self.constant(&p.operand)))
            }
            llvm_ir::Constant::Array { elements, .. } => {
                Constant::Array(elements.iter().map(|e| self.constant(e)).collect())
            }
            llvm_ir::Constant::Struct { values, .. } => {
                Constant::Struct(values.iter().map(|v| self.constant(v)).collect())
            }
            c => Constant::Other(convert_type(&c.get_type(self.types))),
        }
    }

    fn operand(&self, op: &llvm_ir::Operand) -> Operand {
        match op {
            llvm_ir::Operand::LocalOperand { name: n, ty } => Operand::Local {
                name: LocalName::from(name(n)),
                ty: convert_type(ty),
            },
            llvm_ir::Operand::ConstantOperand(c) => Operand::Constant(self.constant(c)),
            llvm_ir::Operand::MetadataOperand => Operand::Metadata,
        }
    }

    fn callee(&self, f: &Either<llvm_ir::instruction::InlineAssembly, llvm_ir::Operand>) -> Callee {
        match f {
            Either::Left(_asm) => Callee::Asm,
            Either::Right(op) => Callee::Operand(self.operand(op)),
        }
    }

    fn opcode(&self, i: &llvm_ir::Instruction) -> Opcode {
        match i {
            llvm_ir::Instruction::Add(a) => Opcode::Add(Add {
                operand0: self.operand(&a.operand0),
                operand1: self.operand(&a.operand1),
            }),
            llvm_ir::Instruction::Alloca(a) => Opcode::Alloca(Alloca {
                allocated_type: convert_type(&a.allocated_type),
                num_elements: self.operand(&a.num_elements),
            }),
            llvm_ir::Instruction::AtomicRMW(a) => Opcode::AtomicRmw(AtomicRmw {
                pointer: self.operand(&a.address),
                value: self.operand(&a.value),
            }),
            llvm_ir::Instruction::BitCast(b) => Opcode::BitCast(BitCast {
                operand: self.operand(&b.operand),
            }),
            llvm_ir::Instruction::Call(c) => Opcode::Call(Call {
                callee: self.callee(&c.function),
                args: c.arguments.iter().map(|(op, _)| self.operand(op)).collect(),
            }),
            llvm_ir::Instruction::CmpXchg(c) => Opcode::CmpXchg(CmpXchg {
                pointer: self.operand(&c.address),
                expected: self.operand(&c.expected),
                replacement: self.operand(&c.replacement),
            }),
            llvm_ir::Instruction::ExtractValue(e) => Opcode::ExtractValue(ExtractValue {
                aggregate: self.operand(&e.aggregate),
                indices: e.indices.clone(),
            }),
            llvm_ir::Instruction::GetElementPtr(g) => Opcode::GetElementPtr(GetElementPtr {
                pointer: self.operand(&g.address),
                indices: g.indices.iter().map(|op| self.operand(op)).collect(),
            }),
            llvm_ir::Instruction::ICmp(i) => Opcode::Icmp(Icmp {
                operand0: self.operand(&i.operand0),
                operand1: self.operand(&i.operand1),
            }),
            llvm_ir::Instruction::InsertValue(i) => Opcode::InsertValue(InsertValue {
                aggregate: self.operand(&i.aggregate),
                element: self.operand(&i.element),
                indices: i.indices.clone(),
            }),
            llvm_ir::Instruction::IntToPtr(i) => Opcode::IntToPtr(IntToPtr {
                int: self.operand(&i.operand),
            }),
            llvm_ir::Instruction::LandingPad(_) => Opcode::LandingPad,
            llvm_ir::Instruction::Load(l) => Opcode::Load(Load {
                pointer: self.operand(&l.address),
            }),
            llvm_ir::Instruction::Phi(p) => Opcode::Phi(Phi {
                incoming: p
                    .incoming_values
                    .iter()
                    .map(|(op, b)| (self.operand(op), BlockName::from(name(b))))
                    .collect(),
            }),
            llvm_ir::Instruction::PtrToInt(p) => Opcode::PtrToInt(PtrToInt {
                pointer: self.operand(&p.operand),
            }),
            llvm_ir::Instruction::Select(s) => Opcode::Select(Select {
                condition: self.operand(&s.condition),
                true_value: self.operand(&s.true_value),
                false_value: self.operand(&s.false_value),
            }),
            llvm_ir::Instruction::Store(s) => Opcode::Store(Store {
                value: self.operand(&s.value),
                pointer: self.operand(&s.address),
            }),
            llvm_ir::Instruction::Sub(s) => Opcode::Sub(Sub {
                minuend: self.operand(&s.operand0),
                subtrahend: self.operand(&s.operand1),
            }),
            llvm_ir::Instruction::VAArg(v) => Opcode::VaArg(VaArg {
                list: self.operand(&v.arg_list),
            }),
            i => Opcode::Other {
                opcode: opcode_name(i),
                operands: vec![],
            },
        }
    }

    fn terminator(&self, t: &llvm_ir::Terminator) -> TerminatorOpcode {
        match t {
            llvm_ir::Terminator::Invoke(i) => TerminatorOpcode::Invoke(Invoke {
                callee: self.callee(&i.function),
                args: i.arguments.iter().map(|(op, _)| self.operand(op)).collect(),
                return_label: BlockName::from(name(&i.return_label)),
                exception_label: BlockName::from(name(&i.exception_label)),
            }),
            llvm_ir::Terminator::Resume(r) => TerminatorOpcode::Resume(Resume {
                operand: self.operand(&r.operand),
            }),
            llvm_ir::Terminator::Ret(r) => TerminatorOpcode::Ret(Ret {
                operand: r.return_operand.as_ref().map(|o| self.operand(o)),
            }),
            t => TerminatorOpcode::Other {
                opcode: opcode_name(t),
                operands: vec![],
            },
        }
    }

    fn block(&self, b: &llvm_ir::BasicBlock) -> Block {
        Block {
            name: BlockName::from(name(&b.name)),
            instrs: b
                .instrs
                .iter()
                .map(|i| Instruction {
                    result: i.try_get_result().map(|n| LocalName::from(name(n))),
                    ty: convert_type(&i.get_type(self.types)),
                    opcode: self.opcode(i),
                })
                .collect(),
            terminator: Terminator {
                result: b.term.try_get_result().map(|n| LocalName::from(name(n))),
                ty: convert_type(&b.term.get_type(self.types)),
                opcode: self.terminator(&b.term),
            },
        }
    }

    fn parameters(&self, ps: &[llvm_ir::function::Parameter]) -> Vec<Parameter> {
        ps.iter()
            .map(|p| Parameter {
                name: LocalName::from(name(&p.name)),
                ty: convert_type(&p.ty),
            })
            .collect()
    }
}

impl Module {
    /// Load and convert an LLVM 14 bitcode module.
    pub fn from_bc_path(path: &Path) -> Result<Self, Error> {
        let m = llvm_ir::Module::from_bc_path(path).map_err(Error)?;
        let module = Self::from_llvm(&m);
        module.validate()?;
        Ok(module)
    }

    pub fn from_llvm(m: &llvm_ir::Module) -> Self {
        let functions = m
            .functions
            .iter()
            .map(|f| f.name.as_str())
            .chain(m.func_declarations.iter().map(|d| d.name.as_str()))
            .collect();
        let cvt = Converter {
            types: &m.types,
            functions,
        };

        let mut functions = Vec::with_capacity(m.functions.len() + m.func_declarations.len());
        for f in &m.functions {
            functions.push(Function {
                name: FunctionName::from(f.name.as_str()),
                parameters: cvt.parameters(&f.parameters),
                return_type: convert_type(&f.return_type),
                is_var_arg: f.is_var_arg,
                blocks: f.basic_blocks.iter().map(|b| cvt.block(b)).collect(),
            });
        }
        for d in &m.func_declarations {
            functions.push(Function {
                name: FunctionName::from(d.name.as_str()),
                parameters: cvt.parameters(&d.parameters),
                return_type: convert_type(&d.return_type),
                is_var_arg: d.is_var_arg,
                blocks: vec![],
            });
        }

        let globals = m
            .global_vars
            .iter()
            .map(|g| Global {
                name: GlobalName::from(g.name.clone()),
                ty: match &*g.ty {
                    // Globals always have pointer types at the top level, so
                    // look inside
                    llvm_ir::Type::PointerType { pointee_type, .. } => convert_type(pointee_type),
                    _ => Type::Other,
                },
                initializer: g.initializer.as_ref().map(|c| cvt.constant(c)),
                is_const: g.is_constant,
            })
            .collect();

        Module { functions, globals }
    }
}
