// src/cli/args.rs

use clap::Parser;
use std::path::PathBuf;

/// O language compiler: lowers `.o` source files to LLVM IR text.
#[derive(Parser)]
#[command(name = "olang")]
#[command(version)]
#[command(about = "Compiler for the O object language", long_about = None)]
pub struct Cli {
    /// Source file to compile. Without one, a built-in sample program is
    /// compiled to ./output.ll.
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Where to write the LLVM IR (default: the input path with a .ll
    /// extension)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
