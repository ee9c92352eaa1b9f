// SPDX-License-Identifier: BSD-3-Clause
//! Representation of an LLVM module that is amenable to constraint
//! collection.
//!
//! The structure mirrors LLVM (module, functions, blocks, instructions with
//! typed operands) but is plain data: it can be loaded from JSON, built by
//! hand in tests, or (with the `llvm` feature) converted from bitcode. Once
//! loaded and validated it is never mutated.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::instruction::Opcode;

#[cfg(feature = "llvm")]
mod bitcode;
mod constant;
pub use constant::*;
mod error;
pub use error::*;
pub mod instruction;
mod name;
pub use name::*;
mod operand;
pub use operand::*;
pub mod terminator;
pub use terminator::*;
mod types;
pub use types::*;

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default)]
    pub result: Option<LocalName>,
    #[serde(default)]
    pub ty: Type,
    pub opcode: Opcode,
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Some(r) => write!(f, "{} = {}", r, self.opcode),
            None => write!(f, "{}", self.opcode),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminator {
    #[serde(default)]
    pub result: Option<LocalName>,
    #[serde(default)]
    pub ty: Type,
    pub opcode: TerminatorOpcode,
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Some(r) => write!(f, "{} = {}", r, self.opcode),
            None => write!(f, "{}", self.opcode),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: BlockName,
    #[serde(default)]
    pub instrs: Vec<Instruction>,
    pub terminator: Terminator,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: LocalName,
    pub ty: Type,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Function {
    pub name: FunctionName,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Type,
    #[serde(default)]
    pub is_var_arg: bool,
    /// Empty for declarations
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn is_intrinsic(&self) -> bool {
        self.name.starts_with("llvm.")
    }

    fn validate(
        &self,
        functions: &HashSet<&FunctionName>,
        globals: &HashSet<&GlobalName>,
    ) -> Result<(), Error> {
        let mut locals = HashMap::new();
        for p in &self.parameters {
            if locals.insert(&p.name, &p.ty).is_some() {
                return Err(Error(format!(
                    "Duplicate local {} in {}",
                    p.name, self.name
                )));
            }
        }

        let mut blocks = HashSet::with_capacity(self.blocks.len());
        for b in &self.blocks {
            if !blocks.insert(&b.name) {
                return Err(Error(format!(
                    "Duplicate block {} in {}",
                    b.name, self.name
                )));
            }
            let results = b
                .instrs
                .iter()
                .map(|i| (&i.result, &i.ty, i.to_string()))
                .chain(std::iter::once((
                    &b.terminator.result,
                    &b.terminator.ty,
                    b.terminator.to_string(),
                )));
            for (result, ty, text) in results {
                match result {
                    Some(n) => {
                        if locals.insert(n, ty).is_some() {
                            return Err(Error(format!("Duplicate local {} in {}", n, self.name)));
                        }
                    }
                    None if ty.is_pointer() => {
                        return Err(Error(format!(
                            "Pointer-typed instruction without a result in {}: {}",
                            self.name, text
                        )));
                    }
                    None => (),
                }
            }
        }

        // Operands may refer to locals defined later in the function (phi
        // nodes), so check them after collecting every definition.
        for b in &self.blocks {
            let operands = b
                .instrs
                .iter()
                .flat_map(|i| i.opcode.operands())
                .chain(b.terminator.opcode.operands());
            for op in operands {
                if let Operand::Local { name, ty } = op {
                    match locals.get(name) {
                        None => {
                            return Err(Error(format!("Bad local: {} in {}", name, self.name)))
                        }
                        Some(def) if *def != ty => {
                            return Err(Error(format!(
                                "Mistyped local {} in {}: used as {}, defined as {}",
                                name, self.name, ty, def
                            )))
                        }
                        Some(_) => (),
                    }
                }
                if let Some(c) = op.constant() {
                    validate_constant(functions, globals, c)?;
                }
            }
        }
        Ok(())
    }
}

fn validate_constant(
    functions: &HashSet<&FunctionName>,
    globals: &HashSet<&GlobalName>,
    c: &Constant,
) -> Result<(), Error> {
    match c {
        Constant::Function(f) if !functions.contains(f) => {
            Err(Error(format!("Couldn't find function {}", f)))
        }
        Constant::Global(g) if !globals.contains(g) => {
            Err(Error(format!("Couldn't find global {}", g)))
        }
        _ => {
            for child in c.children() {
                validate_constant(functions, globals, child)?;
            }
            Ok(())
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Global {
    pub name: GlobalName,
    /// Type of the value stored in the global (the global itself is always
    /// a pointer).
    pub ty: Type,
    #[serde(default)]
    pub initializer: Option<Constant>,
    #[serde(default)]
    pub is_const: bool,
}

/// A module. Functions and globals are kept in declaration order, which is
/// the order constraints are collected in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub globals: Vec<Global>,
}

impl Module {
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let module: Module = serde_json::from_str(s)?;
        module.validate()?;
        Ok(module)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| Error(format!("Couldn't read {}: {}", path.display(), e)))?;
        Self::from_json(&s)
    }

    /// Check the invariants the collector relies on: names are unique, every
    /// local operand is defined in its function with the type it is used
    /// at, every global reference
    /// resolves, and every pointer-typed instruction has a result.
    pub fn validate(&self) -> Result<(), Error> {
        let mut functions = HashSet::with_capacity(self.functions.len());
        for f in &self.functions {
            if !functions.insert(&f.name) {
                return Err(Error(format!("Duplicate function {}", f.name)));
            }
        }
        let mut globals = HashSet::with_capacity(self.globals.len());
        for g in &self.globals {
            if !globals.insert(&g.name) {
                return Err(Error(format!("Duplicate global {}", g.name)));
            }
        }
        for g in &self.globals {
            if let Some(init) = &g.initializer {
                validate_constant(&functions, &globals, init)?;
            }
        }
        for f in &self.functions {
            f.validate(&functions, &globals)?;
        }
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Module, Type};

    fn module(v: serde_json::Value) -> Result<Module, super::Error> {
        Module::from_json(&v.to_string())
    }

    #[test]
    fn loads_declaration() {
        let m = module(json!({
            "functions": [{ "name": "malloc", "return-type": "pointer" }]
        }))
        .unwrap();
        let f = m.function("malloc").unwrap();
        assert!(f.is_declaration());
        assert!(!f.is_intrinsic());
        assert_eq!(Type::Pointer, f.return_type);
    }

    #[test]
    fn forward_reference_is_fine() {
        let m = module(json!({
            "functions": [{
                "name": "f",
                "return-type": "pointer",
                "blocks": [
                    {
                        "name": "entry",
                        "terminator": { "opcode": { "other": { "opcode": "br" } } }
                    },
                    {
                        "name": "loop",
                        "instrs": [{
                            "result": "p",
                            "ty": "pointer",
                            "opcode": { "phi": { "incoming": [
                                [{ "local": { "name": "q", "ty": "pointer" } }, "loop"],
                                [{ "constant": "null" }, "entry"]
                            ] } }
                        }, {
                            "result": "q",
                            "ty": "pointer",
                            "opcode": { "get-element-ptr": {
                                "pointer": { "local": { "name": "p", "ty": "pointer" } }
                            } }
                        }],
                        "terminator": { "opcode": { "ret": {
                            "operand": { "local": { "name": "q", "ty": "pointer" } }
                        } } }
                    }
                ]
            }]
        }));
        assert!(m.is_ok(), "{:?}", m);
    }

    #[test]
    fn rejects_bad_local() {
        let err = module(json!({
            "functions": [{
                "name": "f",
                "blocks": [{
                    "name": "entry",
                    "terminator": { "opcode": { "ret": {
                        "operand": { "local": { "name": "nope", "ty": "pointer" } }
                    } } }
                }]
            }]
        }))
        .unwrap_err();
        assert!(err.0.contains("Bad local: %nope"), "{}", err);
    }

    #[test]
    fn rejects_mistyped_local() {
        let program = |p: serde_json::Value, used: serde_json::Value| {
            module(json!({
                "functions": [{
                    "name": "f",
                    "parameters": [
                        { "name": "p", "ty": p },
                        { "name": "q", "ty": "pointer" }
                    ],
                    "blocks": [{
                        "name": "entry",
                        "instrs": [{ "opcode": { "store": {
                            "value": { "local": { "name": "p", "ty": used } },
                            "pointer": { "local": { "name": "q", "ty": "pointer" } }
                        } } }],
                        "terminator": { "opcode": { "ret": {} } }
                    }]
                }]
            }))
        };
        let int = json!({ "integer": { "bits": 64 } });

        // A pointer hidden behind an integer annotation
        let err = program(json!("pointer"), int.clone()).unwrap_err();
        assert!(err.0.contains("Mistyped local %p in @f"), "{}", err);

        // An integer passed off as a pointer
        let err = program(int.clone(), json!("pointer")).unwrap_err();
        assert!(err.0.contains("Mistyped local %p in @f"), "{}", err);

        assert!(program(int.clone(), int).is_ok());
    }

    #[test]
    fn rejects_duplicate_local() {
        let alloca = json!({
            "result": "a",
            "ty": "pointer",
            "opcode": { "alloca": { "allocated-type": "pointer" } }
        });
        let err = module(json!({
            "functions": [{
                "name": "f",
                "blocks": [{
                    "name": "entry",
                    "instrs": [alloca.clone(), alloca],
                    "terminator": { "opcode": { "ret": {} } }
                }]
            }]
        }))
        .unwrap_err();
        assert!(err.0.contains("Duplicate local %a"), "{}", err);
    }

    #[test]
    fn rejects_unknown_global() {
        let err = module(json!({
            "globals": [{
                "name": "g",
                "ty": "pointer",
                "initializer": { "global": "h" }
            }]
        }))
        .unwrap_err();
        assert!(err.0.contains("Couldn't find global @h"), "{}", err);
    }

    #[test]
    fn rejects_unnamed_pointer_instruction() {
        let err = module(json!({
            "functions": [{
                "name": "f",
                "blocks": [{
                    "name": "entry",
                    "instrs": [{
                        "ty": "pointer",
                        "opcode": { "alloca": { "allocated-type": "pointer" } }
                    }],
                    "terminator": { "opcode": { "ret": {} } }
                }]
            }]
        }))
        .unwrap_err();
        assert!(err.0.contains("without a result"), "{}", err);
    }
}
