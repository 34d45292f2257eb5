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

//! Deterministic, single-threaded interpreter for a small accumulator machine.
//!
//! Program text is assembled into a [`Program`]: a code segment of decoded instructions with
//! resolved jump targets, and a read-only data segment of NUL-terminated strings. A [`Vm`] then
//! executes the program over a fixed register file (main register, four side registers,
//! condition code), a call stack shared between subroutine calls and explicit push/pop, and a
//! bounded byte-addressable memory. Host output goes through the [`Host`] trait.
//!
//! ```
//! use accvm::{Program, StdHost, Vm};
//!
//! let program = Program::assemble("set 42\nsyscall 1\nhalt").unwrap();
//! let mut vm = Vm::new(&program, StdHost::new(Vec::<u8>::new()));
//! vm.run().unwrap();
//! assert_eq!(vm.into_host().into_inner(), b"42");
//! ```

#![deny(unsafe_code)]
#![allow(clippy::new_without_default)]

#[macro_use]
extern crate amplify;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate;

mod core;
pub mod isa;
pub mod program;
pub mod syscall;
mod vm;

pub use self::core::{
    Core, CoreConfig, Fault, Memory, Reg, RegIdx, CALL_STACK_CAPACITY, DEFAULT_MEMORY_SIZE, MEMORY_SIZE_MAX,
    RODATA_BASE, SIDE_REGS,
};
pub use isa::{DataRef, Instr, Pos};
pub use program::{AsmError, ImageError, Label, Program, ResolutionError, SegmentError};
pub use syscall::{Host, StdHost, Syscall};
pub use vm::{ExecState, Trap, Vm};
