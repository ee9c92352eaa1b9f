// SPDX-License-Identifier: BSD-3-Clause
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Format {
    Json,
    Text,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Text => write!(f, "text"),
        }
    }
}

/// Collect Andersen-style points-to constraints from an LLVM module
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Also print the node table (text format)
    #[arg(long)]
    pub debug: bool,

    /// Output format
    #[arg(long, default_value_t = Format::Text)]
    pub format: Format,

    /// Module, as JSON or (with the `llvm` feature) LLVM bitcode
    #[arg()]
    pub module: PathBuf,

    /// Quiet
    #[arg(long)]
    pub quiet: bool,

    /// Tracing
    #[arg(long)]
    pub tracing: bool,
}
