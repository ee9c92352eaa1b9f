// SPDX-License-Identifier: BSD-3-Clause
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use andersen::{analysis::collect_constraints, Module};

// ------------------------------------------------------------------
// Helpers

fn ptr(name: &str) -> Value {
    json!({ "local": { "name": name, "ty": "pointer" } })
}

/// A function that allocates `width` slots, links them into a list with
/// stores, walks the list with loads, and merges the results with a phi.
fn function(idx: usize, width: usize) -> Value {
    let mut instrs = Vec::new();
    for i in 0..width {
        instrs.push(json!({
            "result": format!("a{}", i),
            "ty": "pointer",
            "opcode": { "alloca": { "allocated-type": "pointer" } }
        }));
    }
    for i in 1..width {
        instrs.push(json!({
            "opcode": { "store": {
                "value": ptr(&format!("a{}", i)),
                "pointer": ptr(&format!("a{}", i - 1))
            } }
        }));
    }
    for i in 0..width {
        instrs.push(json!({
            "result": format!("l{}", i),
            "ty": "pointer",
            "opcode": { "load": { "pointer": ptr(&format!("a{}", i)) } }
        }));
        instrs.push(json!({
            "result": format!("g{}", i),
            "ty": "pointer",
            "opcode": { "get-element-ptr": { "pointer": ptr(&format!("l{}", i)) } }
        }));
    }
    let incoming: Vec<Value> = (0..width)
        .map(|i| json!([ptr(&format!("g{}", i)), "entry"]))
        .collect();
    instrs.push(json!({
        "result": "merged",
        "ty": "pointer",
        "opcode": { "phi": { "incoming": incoming } }
    }));
    json!({
        "name": format!("f{}", idx),
        "return-type": "pointer",
        "blocks": [{
            "name": "entry",
            "instrs": instrs,
            "terminator": { "opcode": { "ret": { "operand": ptr("merged") } } }
        }]
    })
}

fn module(functions: usize, width: usize) -> Module {
    let functions: Vec<Value> = (0..functions).map(|i| function(i, width)).collect();
    let globals: Vec<Value> = (0..functions.len())
        .map(|i| {
            json!({
                "name": format!("fp{}", i),
                "ty": "pointer",
                "initializer": { "function": format!("f{}", i) }
            })
        })
        .collect();
    let v = json!({ "functions": functions, "globals": globals });
    match Module::from_json(&v.to_string()) {
        Ok(m) => m,
        Err(e) => panic!("{}", e),
    }
}

// ------------------------------------------------------------------

pub fn small(c: &mut Criterion) {
    let m = module(10, 10);
    c.bench_function("collect_constraints(10x10)", |b| {
        b.iter(|| collect_constraints(black_box(&m)))
    });
}

pub fn wide(c: &mut Criterion) {
    let m = module(10, 1000);
    c.bench_function("collect_constraints(10x1000)", |b| {
        b.iter(|| collect_constraints(black_box(&m)))
    });
}

pub fn many(c: &mut Criterion) {
    let m = module(1000, 10);
    c.bench_function("collect_constraints(1000x10)", |b| {
        b.iter(|| collect_constraints(black_box(&m)))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = small, wide, many
}
criterion_main!(benches);
