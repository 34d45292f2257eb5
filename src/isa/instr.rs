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

use core::fmt::{Debug, Display};
use core::ops::Range;
use std::collections::BTreeSet;

use crate::core::{Core, Fault, Memory, Reg, RegIdx, RODATA_BASE};
use crate::syscall::Host;

/// Position of an instruction inside the code segment.
pub type Pos = u16;

/// Reference to a NUL-terminated literal inside the data segment.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display)]
#[display("@data+{offset:04x}.h[{len}]")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct DataRef {
    /// Offset of the first byte of the literal from the data segment start.
    pub offset: u16,
    /// Length of the literal, including the terminating NUL.
    pub len: u16,
}

impl DataRef {
    #[inline]
    pub const fn new(offset: u16, len: u16) -> Self { DataRef { offset, len } }

    /// Byte range of the literal inside the data segment.
    #[inline]
    pub fn range(self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }

    /// Address of the literal in the machine address space.
    #[inline]
    pub fn addr(self) -> u32 { RODATA_BASE + self.offset as u32 }
}

/// Turing machine movement after instruction execution.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ExecStep {
    /// Stop program execution.
    Stop,

    /// Move to the next instruction.
    Next,

    /// Jump to the position in the code segment.
    Jump(Pos),
}

/// Trait for instructions.
pub trait Instruction: Display + Debug {
    /// Lists all registers which are used by the instruction.
    fn regs(&self) -> BTreeSet<Reg> {
        let mut regs = self.src_regs();
        regs.extend(self.dst_regs());
        regs
    }

    /// List of registers which value is taken into the account by the instruction.
    fn src_regs(&self) -> BTreeSet<Reg>;

    /// List of registers which value may be changed by the instruction.
    fn dst_regs(&self) -> BTreeSet<Reg>;

    /// Executes given instruction taking all registers and memory as input and output.
    ///
    /// # Arguments
    ///
    /// The method is provided with the position of the instruction, which is used for
    /// constructing the call stack.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] if the instruction can't be completed. Registers and memory are left as
    /// they were at the moment of the fault.
    fn exec<H: Host>(
        &self,
        core: &mut Core,
        memory: &mut Memory,
        host: &mut H,
        pos: Pos,
    ) -> Result<ExecStep, Fault>;
}

/// Complete instruction set of the machine.
///
/// Each instruction displays in its assembly form, with jump targets and data references shown
/// as resolved positions instead of labels.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display(inner)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub enum Instr {
    /// Not an operation.
    #[display("nop")]
    Nop,

    /// Stop the program successfully.
    #[display("halt")]
    Halt,

    /// Jump to location (unconditionally).
    #[display("jump {pos:04x}.h")]
    Jump { pos: Pos },

    /// Jump to location if condition code is not zero.
    #[display("jumpNonzero {pos:04x}.h")]
    JumpNonzero { pos: Pos },

    /// Jump to location if condition code is zero.
    #[display("jumpZero {pos:04x}.h")]
    JumpZero { pos: Pos },

    /// Jump to location if condition code is negative.
    #[display("jumpLess {pos:04x}.h")]
    JumpLess { pos: Pos },

    /// Jump to location if condition code is positive.
    #[display("jumpGreater {pos:04x}.h")]
    JumpGreater { pos: Pos },

    /// Jump to location if condition code is not positive.
    #[display("jumpLessEqual {pos:04x}.h")]
    JumpLessEqual { pos: Pos },

    /// Jump to location if condition code is not negative.
    #[display("jumpGreaterEqual {pos:04x}.h")]
    JumpGreaterEqual { pos: Pos },

    /// Subroutine call: pushes position of the next instruction and jumps to location.
    #[display("call {pos:04x}.h")]
    Call { pos: Pos },

    /// Return from a subroutine to the position popped from the call stack.
    #[display("return")]
    Return,

    /// Put a constant value to the main register.
    #[display("set {val}")]
    Set { val: i32 },

    /// Put a constant value to a side register.
    #[display("setRegister {reg} {val}")]
    SetRegister { reg: RegIdx, val: i32 },

    /// Swap values of the main and a side register.
    #[display("swap {reg}")]
    Swap { reg: RegIdx },

    /// Increment main register.
    #[display("increment")]
    Increment,

    /// Decrement main register.
    #[display("decrement")]
    Decrement,

    /// Increment side register. Does not affect condition code.
    #[display("incrementRegister {reg}")]
    IncrementRegister { reg: RegIdx },

    /// Decrement side register. Does not affect condition code.
    #[display("decrementRegister {reg}")]
    DecrementRegister { reg: RegIdx },

    /// Add side register to the main register.
    #[display("add {reg}")]
    Add { reg: RegIdx },

    /// Subtract side register from the main register.
    #[display("sub {reg}")]
    Sub { reg: RegIdx },

    /// Divide main register by a side register, putting the quotient into the main register and
    /// the remainder into the side register.
    #[display("div {reg}")]
    Div { reg: RegIdx },

    /// Set condition code to the difference between the main and a side register, without
    /// modifying either of them.
    #[display("compare {reg}")]
    Compare { reg: RegIdx },

    /// Write low byte of a side register to the address in the main register.
    #[display("write8 {reg}")]
    Write8 { reg: RegIdx },

    /// Write low byte of the main register to a constant address.
    #[display("store8 {addr}")]
    Store8 { addr: u32 },

    /// Write the main register as a 32-bit word to a constant address.
    #[display("store32 {addr}")]
    Store32 { addr: u32 },

    /// Load a byte from a constant address into the main register.
    #[display("load8 {addr}")]
    Load8 { addr: u32 },

    /// Load a 32-bit word from a constant address into the main register.
    #[display("load32 {addr}")]
    Load32 { addr: u32 },

    /// Load a byte from the address in a side register into the main register.
    #[display("deref8 {reg}")]
    Deref8 { reg: RegIdx },

    /// Load a 32-bit word from the address in a side register into the main register.
    #[display("deref32 {reg}")]
    Deref32 { reg: RegIdx },

    /// Copy a data segment literal, including its terminator, to the address in the main
    /// register.
    #[display("copyCodeMemory {data}")]
    CopyCodeMemory { data: DataRef },

    /// Push main register to the call stack.
    #[display("push")]
    Push,

    /// Pop the call stack into the main register.
    #[display("pop")]
    Pop,

    /// Push a side register to the call stack.
    #[display("pushRegister {reg}")]
    PushRegister { reg: RegIdx },

    /// Pop the call stack into a side register.
    #[display("popRegister {reg}")]
    PopRegister { reg: RegIdx },

    /// Host system call.
    #[display("syscall {no}")]
    Syscall { no: u8 },

    /// Opcode which does not correspond to any instruction. Faults when executed.
    #[display("reserved {opcode:#04x}")]
    Reserved { opcode: u8 },
}

impl Instr {
    /// Returns jump target of control flow instructions.
    pub fn target(&self) -> Option<Pos> {
        match *self {
            Instr::Jump { pos }
            | Instr::JumpNonzero { pos }
            | Instr::JumpZero { pos }
            | Instr::JumpLess { pos }
            | Instr::JumpGreater { pos }
            | Instr::JumpLessEqual { pos }
            | Instr::JumpGreaterEqual { pos }
            | Instr::Call { pos } => Some(pos),
            _ => None,
        }
    }
}
