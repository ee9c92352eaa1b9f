// SPDX-License-Identifier: BSD-3-Clause
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use tracing::level_filters::LevelFilter;
use tracing_flame::FlameLayer;
use tracing_subscriber::{fmt, prelude::*};

use andersen::{analysis, llvm};

mod cli;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// Diagnostics always go to stderr. `--tracing` turns on everything and
/// writes a flamegraph to `./tracing.folded`.
fn setup_global_subscriber(tracing: bool) -> Result<Option<impl Drop>> {
    let filter_layer = if tracing {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    let fmt_layer = fmt::Layer::default().with_writer(io::stderr);
    let (flame_layer, guard) = if tracing {
        let (layer, guard) =
            FlameLayer::with_file("./tracing.folded").context("Couldn't set up tracing")?;
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(flame_layer)
        .init();
    Ok(guard)
}

#[cfg(feature = "llvm")]
fn load_bitcode(path: &Path) -> Result<llvm::Module> {
    Ok(llvm::Module::from_bc_path(path)?)
}

#[cfg(not(feature = "llvm"))]
fn load_bitcode(_path: &Path) -> Result<llvm::Module> {
    anyhow::bail!("Reading bitcode requires the `llvm` feature")
}

fn load(path: &Path) -> Result<llvm::Module> {
    let module = if path.extension().map_or(false, |e| e == "bc") {
        load_bitcode(path)
    } else {
        Ok(llvm::Module::from_json_path(path)?)
    };
    module.with_context(|| format!("Couldn't load module at {}", path.display()))
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = cli::Args::parse();
    let _guard = setup_global_subscriber(args.tracing)?;

    let module = load(&args.module)?;
    let (nodes, constraints) =
        analysis::collect_constraints(&module).context("Constraint collection failed")?;

    if args.quiet {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    match args.format {
        cli::Format::Json => {
            serde_json::to_writer_pretty(&mut stdout, &constraints)?;
            writeln!(stdout)?;
        }
        cli::Format::Text => {
            if args.debug {
                writeln!(stdout, "nodes")?;
                writeln!(stdout, "-----")?;
                for (n, kind) in nodes.iter() {
                    writeln!(stdout, "{}: {}", n, kind)?;
                }
                writeln!(stdout)?;
            }
            writeln!(stdout, "constraints")?;
            writeln!(stdout, "-----------")?;
            for c in &constraints {
                writeln!(stdout, "{}", c)?;
            }
        }
    }
    Ok(())
}
