// Accumulator virtual machine: interpreter for label-assembled programs.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use accvm::program::constants::IMAGE_MAGIC;
use accvm::{AsmError, CoreConfig, Program, StdHost, Vm, DEFAULT_MEMORY_SIZE};
use anyhow::{Context, Result};
use clap::Parser;

/// Runs programs for the accumulator virtual machine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the program: assembly text or a binary image produced with `--compile`
    program: PathBuf,

    /// Size of the mutable memory region, in bytes
    #[arg(short, long, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory: u32,

    /// Maximal number of instructions to execute
    #[arg(short, long)]
    step_limit: Option<u64>,

    /// Maximal depth of the call stack
    #[arg(short, long)]
    call_stack_max: Option<usize>,

    /// Write binary image of the assembled program to the given path instead of running it
    #[arg(long, value_name = "OUT")]
    compile: Option<PathBuf>,

    /// Print disassembly listing instead of running the program
    #[arg(short, long, conflicts_with = "compile")]
    disassemble: bool,
}

/// Failure which happened before the program started.
#[derive(Debug)]
struct LoadError(anyhow::Error);

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(LoadError(err)) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Formats a compiler-style diagnostic pointing to the offending line.
fn render_diagnostic(file: &str, source: &str, err: &AsmError) -> String {
    let line = err.line();
    let mut diag = format!("{err}\n --> {file}:{line}\n");
    if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
        diag.push_str(&format!("{line:>4} | {}", text.trim_end_matches('\r')));
    }
    diag
}

fn load(args: &Args) -> Result<Program> {
    let bytes = fs::read(&args.program).with_context(|| format!("cannot read {}", args.program.display()))?;
    if bytes.starts_with(&IMAGE_MAGIC) {
        return Program::from_image(&bytes).context("invalid program image");
    }
    let source = String::from_utf8(bytes).context("program text is not valid UTF-8")?;
    Program::assemble(&source)
        .map_err(|err| anyhow::Error::msg(render_diagnostic(&args.program.display().to_string(), &source, &err)))
}

fn run(args: &Args) -> Result<ExitCode, LoadError> {
    let program = load(args).map_err(LoadError)?;

    if let Some(out) = &args.compile {
        fs::write(out, program.to_image())
            .with_context(|| format!("cannot write {}", out.display()))
            .map_err(LoadError)?;
        return Ok(ExitCode::SUCCESS);
    }

    if args.disassemble {
        print!("{program}");
        return Ok(ExitCode::SUCCESS);
    }

    let config = CoreConfig {
        memory_size: args.memory,
        call_stack_max: args.call_stack_max,
        step_limit: args.step_limit,
    };
    let mut vm = Vm::with(&program, config, StdHost::stdout());
    match vm.run() {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(trap) => {
            eprintln!("fault: {} at {}", trap.fault, program.describe(trap.pos));
            #[cfg(feature = "log")]
            eprintln!("{:#?}", vm.core());
            Ok(ExitCode::FAILURE)
        }
    }
}
