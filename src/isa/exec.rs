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

use std::collections::BTreeSet;

use super::{ExecStep, Instr, Instruction, Pos};
use crate::core::{Core, Fault, Memory, Reg};
use crate::syscall::{Host, Syscall};

impl Instruction for Instr {
    fn src_regs(&self) -> BTreeSet<Reg> {
        match *self {
            Instr::Nop
            | Instr::Halt
            | Instr::Jump { .. }
            | Instr::Call { .. }
            | Instr::Set { .. }
            | Instr::SetRegister { .. }
            | Instr::Load8 { .. }
            | Instr::Load32 { .. }
            | Instr::Reserved { .. } => none!(),

            Instr::JumpNonzero { .. }
            | Instr::JumpZero { .. }
            | Instr::JumpLess { .. }
            | Instr::JumpGreater { .. }
            | Instr::JumpLessEqual { .. }
            | Instr::JumpGreaterEqual { .. } => bset![Reg::Cc],

            Instr::Return | Instr::Pop | Instr::PopRegister { .. } => bset![Reg::Stack],

            Instr::Increment
            | Instr::Decrement
            | Instr::Store8 { .. }
            | Instr::Store32 { .. }
            | Instr::CopyCodeMemory { .. }
            | Instr::Push
            | Instr::Syscall { .. } => bset![Reg::Main],

            Instr::IncrementRegister { reg }
            | Instr::DecrementRegister { reg }
            | Instr::Deref8 { reg }
            | Instr::Deref32 { reg }
            | Instr::PushRegister { reg } => bset![Reg::Side(reg)],

            Instr::Swap { reg }
            | Instr::Add { reg }
            | Instr::Sub { reg }
            | Instr::Div { reg }
            | Instr::Compare { reg }
            | Instr::Write8 { reg } => bset![Reg::Main, Reg::Side(reg)],
        }
    }

    fn dst_regs(&self) -> BTreeSet<Reg> {
        match *self {
            Instr::Nop
            | Instr::Halt
            | Instr::Jump { .. }
            | Instr::JumpNonzero { .. }
            | Instr::JumpZero { .. }
            | Instr::JumpLess { .. }
            | Instr::JumpGreater { .. }
            | Instr::JumpLessEqual { .. }
            | Instr::JumpGreaterEqual { .. }
            | Instr::Write8 { .. }
            | Instr::Store8 { .. }
            | Instr::Store32 { .. }
            | Instr::CopyCodeMemory { .. }
            | Instr::Syscall { .. }
            | Instr::Reserved { .. } => none!(),

            Instr::Call { .. } | Instr::Return | Instr::Push | Instr::PushRegister { .. } => {
                bset![Reg::Stack]
            }

            Instr::Set { .. } | Instr::Increment | Instr::Decrement | Instr::Add { .. } | Instr::Sub { .. } => {
                bset![Reg::Main, Reg::Cc]
            }

            Instr::Load8 { .. } | Instr::Load32 { .. } | Instr::Deref8 { .. } | Instr::Deref32 { .. } => {
                bset![Reg::Main]
            }

            Instr::Pop => bset![Reg::Main, Reg::Stack],

            Instr::SetRegister { reg, .. }
            | Instr::IncrementRegister { reg }
            | Instr::DecrementRegister { reg } => bset![Reg::Side(reg)],

            Instr::PopRegister { reg } => bset![Reg::Side(reg), Reg::Stack],

            Instr::Swap { reg } => bset![Reg::Main, Reg::Side(reg)],

            Instr::Div { reg } => bset![Reg::Main, Reg::Side(reg), Reg::Cc],

            Instr::Compare { .. } => bset![Reg::Cc],
        }
    }

    fn exec<H: Host>(
        &self,
        core: &mut Core,
        memory: &mut Memory,
        host: &mut H,
        pos: Pos,
    ) -> Result<ExecStep, Fault> {
        let jump_if = |cond: bool, to: Pos| if cond { ExecStep::Jump(to) } else { ExecStep::Next };

        match *self {
            Instr::Nop => {}
            Instr::Halt => return Ok(ExecStep::Stop),
            Instr::Jump { pos } => return Ok(ExecStep::Jump(pos)),
            Instr::JumpNonzero { pos } => return Ok(jump_if(core.cc() != 0, pos)),
            Instr::JumpZero { pos } => return Ok(jump_if(core.cc() == 0, pos)),
            Instr::JumpLess { pos } => return Ok(jump_if(core.cc() < 0, pos)),
            Instr::JumpGreater { pos } => return Ok(jump_if(core.cc() > 0, pos)),
            Instr::JumpLessEqual { pos } => return Ok(jump_if(core.cc() <= 0, pos)),
            Instr::JumpGreaterEqual { pos } => return Ok(jump_if(core.cc() >= 0, pos)),
            Instr::Call { pos: to } => {
                core.push_cs(i32::from(pos) + 1)?;
                return Ok(ExecStep::Jump(to));
            }
            Instr::Return => {
                let ret = core.pop_cs()?;
                let to = Pos::try_from(ret).map_err(|_| Fault::CodeOutOfBounds(ret.into()))?;
                return Ok(ExecStep::Jump(to));
            }

            Instr::Set { val } => core.put_a(val),
            Instr::SetRegister { reg, val } => core.set_r(reg, val)?,
            Instr::Swap { reg } => core.swp(reg)?,
            Instr::Increment => core.put_a(core.a().wrapping_add(1)),
            Instr::Decrement => core.put_a(core.a().wrapping_sub(1)),
            Instr::IncrementRegister { reg } => core.set_r(reg, core.r(reg)?.wrapping_add(1))?,
            Instr::DecrementRegister { reg } => core.set_r(reg, core.r(reg)?.wrapping_sub(1))?,
            Instr::Add { reg } => core.put_a(core.a().wrapping_add(core.r(reg)?)),
            Instr::Sub { reg } => core.put_a(core.a().wrapping_sub(core.r(reg)?)),
            Instr::Div { reg } => {
                let divisor = core.r(reg)?;
                if divisor == 0 {
                    return Err(Fault::DivideByZero);
                }
                let dividend = core.a();
                core.set_r(reg, dividend.wrapping_rem(divisor))?;
                core.put_a(dividend.wrapping_div(divisor));
            }
            Instr::Compare { reg } => core.set_cc(i64::from(core.a()) - i64::from(core.r(reg)?)),

            Instr::Write8 { reg } => memory.write_byte(core.a() as u32, core.r(reg)? as u8)?,
            Instr::Store8 { addr } => memory.write_byte(addr, core.a() as u8)?,
            Instr::Store32 { addr } => memory.write_word32(addr, core.a())?,
            Instr::Load8 { addr } => core.set_a(memory.read_byte(addr)?.into()),
            Instr::Load32 { addr } => core.set_a(memory.read_word32(addr)?),
            Instr::Deref8 { reg } => core.set_a(memory.read_byte(core.r(reg)? as u32)?.into()),
            Instr::Deref32 { reg } => core.set_a(memory.read_word32(core.r(reg)? as u32)?),
            Instr::CopyCodeMemory { data } => memory.copy_rodata(data, core.a() as u32)?,

            Instr::Push => {
                core.push_cs(core.a())?;
            }
            Instr::Pop => {
                let val = core.pop_cs()?;
                core.set_a(val);
            }
            Instr::PushRegister { reg } => {
                core.push_cs(core.r(reg)?)?;
            }
            Instr::PopRegister { reg } => {
                // register is checked before the stack gets modified
                core.r(reg)?;
                let val = core.pop_cs()?;
                core.set_r(reg, val)?;
            }

            Instr::Syscall { no } => Syscall::try_from(no)?.dispatch(core, memory, host)?,
            Instr::Reserved { opcode } => return Err(Fault::InvalidOpcode(opcode)),
        }
        Ok(ExecStep::Next)
    }
}
