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

use std::error::Error;

use super::{DataRef, Instr};
use crate::core::RegIdx;

/// Non-failing byte encoding for the instruction set.
///
/// Each instruction is an opcode byte followed by its operands: positions and data segment
/// offsets are little-endian 16-bit words, immediates and addresses are little-endian 32-bit
/// words, register indexes and system call numbers are single bytes.
pub trait Bytecode {
    /// Returns byte representing instruction code (without its arguments).
    fn opcode_byte(&self) -> u8;

    /// Write an instruction as bytecode.
    fn encode_instr<W>(&self, writer: &mut W) -> Result<(), W::Error>
    where W: BytecodeWrite {
        writer.write_byte(self.opcode_byte())?;
        self.encode_operands(writer)
    }

    /// Writes an instruction operands as bytecode, omitting opcode byte.
    fn encode_operands<W>(&self, writer: &mut W) -> Result<(), W::Error>
    where W: BytecodeWrite;

    /// Reads an instruction from bytecode.
    fn decode_instr<R>(reader: &mut R) -> Result<Self, CodeEofError>
    where
        Self: Sized,
        R: BytecodeRead,
    {
        let opcode = reader.read_byte()?;
        Self::decode_operands(reader, opcode)
    }

    /// Reads an instruction operands from bytecode, provided the opcode byte.
    fn decode_operands<R>(reader: &mut R, opcode: u8) -> Result<Self, CodeEofError>
    where
        Self: Sized,
        R: BytecodeRead;
}

/// Error indicating that an end of code segment boundary is reached during read or write
/// operation.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display("attempt to read or write outside of code segment")]
pub struct CodeEofError;

/// Reader from a bytecode for instruction deserialization.
pub trait BytecodeRead {
    /// Return current byte offset of the cursor.
    fn pos(&self) -> usize;
    /// Return whether end of the bytecode is reached.
    fn is_eof(&self) -> bool;

    /// Read byte.
    fn read_byte(&mut self) -> Result<u8, CodeEofError>;
    /// Read word.
    fn read_word(&mut self) -> Result<u16, CodeEofError> {
        self.read_fixed(u16::from_le_bytes)
    }
    /// Read fixed number of bytes and convert it into a result type.
    fn read_fixed<N, const LEN: usize>(&mut self, f: impl FnOnce([u8; LEN]) -> N) -> Result<N, CodeEofError>;
}

/// Writer converting instructions into a bytecode.
pub trait BytecodeWrite {
    type Error: Error;

    /// Write byte.
    fn write_byte(&mut self, data: u8) -> Result<(), Self::Error>;
    /// Write word.
    fn write_word(&mut self, data: u16) -> Result<(), Self::Error> { self.write_fixed(data.to_le_bytes()) }
    /// Write data representable as a fixed-length byte array.
    fn write_fixed<const LEN: usize>(&mut self, data: [u8; LEN]) -> Result<(), Self::Error>;
}

impl Instr {
    pub const NOP: u8 = 0x00;
    pub const HALT: u8 = 0x01;
    pub const JUMP: u8 = 0x02;
    pub const JNZ: u8 = 0x03;
    pub const JZ: u8 = 0x04;
    pub const JLT: u8 = 0x05;
    pub const JGT: u8 = 0x06;
    pub const JLE: u8 = 0x07;
    pub const JGE: u8 = 0x08;
    pub const CALL: u8 = 0x09;
    pub const RET: u8 = 0x0A;

    pub const SET: u8 = 0x10;
    pub const SETR: u8 = 0x11;
    pub const SWAP: u8 = 0x12;
    pub const INC: u8 = 0x13;
    pub const DEC: u8 = 0x14;
    pub const INCR: u8 = 0x15;
    pub const DECR: u8 = 0x16;
    pub const ADD: u8 = 0x17;
    pub const SUB: u8 = 0x18;
    pub const DIV: u8 = 0x19;
    pub const CMP: u8 = 0x1A;

    pub const WRITE8: u8 = 0x20;
    pub const STORE8: u8 = 0x21;
    pub const STORE32: u8 = 0x22;
    pub const LOAD8: u8 = 0x23;
    pub const LOAD32: u8 = 0x24;
    pub const DEREF8: u8 = 0x25;
    pub const DEREF32: u8 = 0x26;
    pub const COPY: u8 = 0x27;

    pub const PUSH: u8 = 0x30;
    pub const POP: u8 = 0x31;
    pub const PUSHR: u8 = 0x32;
    pub const POPR: u8 = 0x33;

    pub const SYSCALL: u8 = 0x40;
}

impl Bytecode for Instr {
    fn opcode_byte(&self) -> u8 {
        match self {
            Instr::Nop => Self::NOP,
            Instr::Halt => Self::HALT,
            Instr::Jump { .. } => Self::JUMP,
            Instr::JumpNonzero { .. } => Self::JNZ,
            Instr::JumpZero { .. } => Self::JZ,
            Instr::JumpLess { .. } => Self::JLT,
            Instr::JumpGreater { .. } => Self::JGT,
            Instr::JumpLessEqual { .. } => Self::JLE,
            Instr::JumpGreaterEqual { .. } => Self::JGE,
            Instr::Call { .. } => Self::CALL,
            Instr::Return => Self::RET,
            Instr::Set { .. } => Self::SET,
            Instr::SetRegister { .. } => Self::SETR,
            Instr::Swap { .. } => Self::SWAP,
            Instr::Increment => Self::INC,
            Instr::Decrement => Self::DEC,
            Instr::IncrementRegister { .. } => Self::INCR,
            Instr::DecrementRegister { .. } => Self::DECR,
            Instr::Add { .. } => Self::ADD,
            Instr::Sub { .. } => Self::SUB,
            Instr::Div { .. } => Self::DIV,
            Instr::Compare { .. } => Self::CMP,
            Instr::Write8 { .. } => Self::WRITE8,
            Instr::Store8 { .. } => Self::STORE8,
            Instr::Store32 { .. } => Self::STORE32,
            Instr::Load8 { .. } => Self::LOAD8,
            Instr::Load32 { .. } => Self::LOAD32,
            Instr::Deref8 { .. } => Self::DEREF8,
            Instr::Deref32 { .. } => Self::DEREF32,
            Instr::CopyCodeMemory { .. } => Self::COPY,
            Instr::Push => Self::PUSH,
            Instr::Pop => Self::POP,
            Instr::PushRegister { .. } => Self::PUSHR,
            Instr::PopRegister { .. } => Self::POPR,
            Instr::Syscall { .. } => Self::SYSCALL,
            Instr::Reserved { opcode } => *opcode,
        }
    }

    fn encode_operands<W>(&self, writer: &mut W) -> Result<(), W::Error>
    where W: BytecodeWrite {
        match *self {
            Instr::Nop
            | Instr::Halt
            | Instr::Return
            | Instr::Increment
            | Instr::Decrement
            | Instr::Push
            | Instr::Pop
            | Instr::Reserved { .. } => {}

            Instr::Jump { pos }
            | Instr::JumpNonzero { pos }
            | Instr::JumpZero { pos }
            | Instr::JumpLess { pos }
            | Instr::JumpGreater { pos }
            | Instr::JumpLessEqual { pos }
            | Instr::JumpGreaterEqual { pos }
            | Instr::Call { pos } => writer.write_word(pos)?,

            Instr::Set { val } => writer.write_fixed(val.to_le_bytes())?,
            Instr::SetRegister { reg, val } => {
                writer.write_byte(reg.to_u8())?;
                writer.write_fixed(val.to_le_bytes())?;
            }

            Instr::Swap { reg }
            | Instr::IncrementRegister { reg }
            | Instr::DecrementRegister { reg }
            | Instr::Add { reg }
            | Instr::Sub { reg }
            | Instr::Div { reg }
            | Instr::Compare { reg }
            | Instr::Write8 { reg }
            | Instr::Deref8 { reg }
            | Instr::Deref32 { reg }
            | Instr::PushRegister { reg }
            | Instr::PopRegister { reg } => writer.write_byte(reg.to_u8())?,

            Instr::Store8 { addr } | Instr::Store32 { addr } | Instr::Load8 { addr } | Instr::Load32 { addr } => {
                writer.write_fixed(addr.to_le_bytes())?
            }

            Instr::CopyCodeMemory { data } => {
                writer.write_word(data.offset)?;
                writer.write_word(data.len)?;
            }

            Instr::Syscall { no } => writer.write_byte(no)?,
        }
        Ok(())
    }

    fn decode_operands<R>(reader: &mut R, opcode: u8) -> Result<Self, CodeEofError>
    where
        Self: Sized,
        R: BytecodeRead,
    {
        let reg = |reader: &mut R| reader.read_byte().map(RegIdx::from);
        let imm = |reader: &mut R| reader.read_fixed(i32::from_le_bytes);
        let addr = |reader: &mut R| reader.read_fixed(u32::from_le_bytes);

        Ok(match opcode {
            Self::NOP => Instr::Nop,
            Self::HALT => Instr::Halt,
            Self::JUMP => Instr::Jump { pos: reader.read_word()? },
            Self::JNZ => Instr::JumpNonzero { pos: reader.read_word()? },
            Self::JZ => Instr::JumpZero { pos: reader.read_word()? },
            Self::JLT => Instr::JumpLess { pos: reader.read_word()? },
            Self::JGT => Instr::JumpGreater { pos: reader.read_word()? },
            Self::JLE => Instr::JumpLessEqual { pos: reader.read_word()? },
            Self::JGE => Instr::JumpGreaterEqual { pos: reader.read_word()? },
            Self::CALL => Instr::Call { pos: reader.read_word()? },
            Self::RET => Instr::Return,

            Self::SET => Instr::Set { val: imm(reader)? },
            Self::SETR => {
                let reg = reg(reader)?;
                Instr::SetRegister { reg, val: imm(reader)? }
            }
            Self::SWAP => Instr::Swap { reg: reg(reader)? },
            Self::INC => Instr::Increment,
            Self::DEC => Instr::Decrement,
            Self::INCR => Instr::IncrementRegister { reg: reg(reader)? },
            Self::DECR => Instr::DecrementRegister { reg: reg(reader)? },
            Self::ADD => Instr::Add { reg: reg(reader)? },
            Self::SUB => Instr::Sub { reg: reg(reader)? },
            Self::DIV => Instr::Div { reg: reg(reader)? },
            Self::CMP => Instr::Compare { reg: reg(reader)? },

            Self::WRITE8 => Instr::Write8 { reg: reg(reader)? },
            Self::STORE8 => Instr::Store8 { addr: addr(reader)? },
            Self::STORE32 => Instr::Store32 { addr: addr(reader)? },
            Self::LOAD8 => Instr::Load8 { addr: addr(reader)? },
            Self::LOAD32 => Instr::Load32 { addr: addr(reader)? },
            Self::DEREF8 => Instr::Deref8 { reg: reg(reader)? },
            Self::DEREF32 => Instr::Deref32 { reg: reg(reader)? },
            Self::COPY => {
                let offset = reader.read_word()?;
                let len = reader.read_word()?;
                Instr::CopyCodeMemory { data: DataRef::new(offset, len) }
            }

            Self::PUSH => Instr::Push,
            Self::POP => Instr::Pop,
            Self::PUSHR => Instr::PushRegister { reg: reg(reader)? },
            Self::POPR => Instr::PopRegister { reg: reg(reader)? },

            Self::SYSCALL => Instr::Syscall { no: reader.read_byte()? },

            opcode => Instr::Reserved { opcode },
        })
    }
}
