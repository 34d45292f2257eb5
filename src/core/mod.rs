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

//! Machine state: registers, condition code, call stack and memory.

#[allow(clippy::module_inception)]
mod core;
mod fault;
mod memory;
mod microcode;
mod regs;

pub use self::core::{Core, CoreConfig, CALL_STACK_CAPACITY};
pub use self::fault::Fault;
pub use self::memory::{Memory, DEFAULT_MEMORY_SIZE, MEMORY_SIZE_MAX, RODATA_BASE};
pub use self::regs::{Reg, RegIdx, SIDE_REGS};
