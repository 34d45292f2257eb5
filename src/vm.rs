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

use crate::core::{Core, CoreConfig, Fault, Memory};
use crate::isa::{ExecStep, Instruction, Pos};
use crate::syscall::Host;
use crate::Program;

/// Fault together with the position of the instruction which caused it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display("{fault} (at instruction {pos:04x}.h)")]
pub struct Trap {
    /// Position of the faulting instruction.
    pub pos: Pos,
    /// The fault.
    pub fault: Fault,
}

/// Execution state of a [`Vm`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum ExecState {
    /// The program may be stepped further.
    #[display("running")]
    Running,

    /// The program executed `halt`.
    #[display("halted")]
    Halted,

    /// The program was terminated by a fault.
    #[display("faulted: {0}")]
    Faulted(Trap),
}

/// Virtual machine providing single-core execution environment for a [`Program`].
///
/// Each machine owns its registers and memory and borrows the program, so a program may be run by
/// any number of machines, each starting from the same initial state.
pub struct Vm<'p, H: Host> {
    program: &'p Program,
    core: Core,
    memory: Memory<'p>,
    host: H,
    ip: Pos,
    state: ExecState,
}

impl<'p, H: Host> Vm<'p, H> {
    /// Constructs new virtual machine instance with default configuration.
    #[inline]
    pub fn new(program: &'p Program, host: H) -> Self { Vm::with(program, default!(), host) }

    /// Constructs new virtual machine instance using configuration object [`CoreConfig`].
    pub fn with(program: &'p Program, config: CoreConfig, host: H) -> Self {
        Vm {
            program,
            core: Core::with(config),
            memory: Memory::new(config.effective_memory_size(), program.data().as_slice()),
            host,
            ip: 0,
            state: ExecState::Running,
        }
    }

    #[inline]
    pub fn program(&self) -> &'p Program { self.program }

    #[inline]
    pub fn core(&self) -> &Core { &self.core }

    #[inline]
    pub fn memory(&self) -> &Memory<'p> { &self.memory }

    #[inline]
    pub fn host(&self) -> &H { &self.host }

    #[inline]
    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    /// Consumes the machine, returning its host.
    #[inline]
    pub fn into_host(self) -> H { self.host }

    /// Position of the next instruction to execute.
    #[inline]
    pub fn ip(&self) -> Pos { self.ip }

    #[inline]
    pub fn state(&self) -> ExecState { self.state }

    fn trap(&mut self, fault: Fault) -> Trap {
        let trap = Trap { pos: self.ip, fault };
        self.state = ExecState::Faulted(trap);
        trap
    }

    /// Executes a single instruction.
    ///
    /// # Returns
    ///
    /// `true` if the program may be stepped further, `false` once it has halted.
    ///
    /// # Errors
    ///
    /// Returns [`Trap`] if the instruction faulted. The machine is terminal after that, and every
    /// subsequent call returns the same trap.
    pub fn step(&mut self) -> Result<bool, Trap> {
        #[cfg(feature = "log")]
        let (m, w, d, g, r, y, z) =
            ("\x1B[0;35m", "\x1B[1;1m", "\x1B[0;37;2m", "\x1B[0;32m", "\x1B[0;31m", "\x1B[0;33m", "\x1B[0m");

        match self.state {
            ExecState::Running => {}
            ExecState::Halted => return Ok(false),
            ExecState::Faulted(trap) => return Err(trap),
        }

        let pos = self.ip;
        let Some(instr) = self.program.instr(pos) else {
            #[cfg(feature = "log")]
            eprintln!("{m}@x{pos:04X}:{z} {r}jump outside of the code segment; halting{z}");
            return Err(self.trap(Fault::CodeOutOfBounds(pos.into())));
        };

        if let Err(fault) = self.core.acc_step() {
            #[cfg(feature = "log")]
            eprintln!("{m}@x{pos:04X}:{z} {r}step limit reached; halting{z}");
            return Err(self.trap(fault));
        }

        #[cfg(feature = "log")]
        {
            eprint!("{m}@x{pos:04X}:{z} {: <32}; ", instr.to_string());
            for reg in instr.src_regs() {
                let val = self.core.get(reg).map(|v| v.to_string()).unwrap_or_else(|| s!("~"));
                eprint!("{d}{reg} {z}{w}{val}{z}, ");
            }
        }

        let next = instr.exec(&mut self.core, &mut self.memory, &mut self.host, pos);

        #[cfg(feature = "log")]
        {
            eprint!("-> ");
            for reg in instr.dst_regs() {
                let val = self.core.get(reg).map(|v| v.to_string()).unwrap_or_else(|| s!("~"));
                eprint!("{g}{reg} {y}{val}{z}, ");
            }
            if let Err(fault) = next {
                eprint!("{r}{fault}{z}");
            }
            eprintln!();
        }

        match next {
            Ok(ExecStep::Next) => match pos.checked_add(1) {
                Some(ip) => self.ip = ip,
                None => return Err(self.trap(Fault::CodeOutOfBounds(i64::from(pos) + 1))),
            },
            Ok(ExecStep::Jump(to)) => self.ip = to,
            Ok(ExecStep::Stop) => {
                #[cfg(feature = "log")]
                eprintln!("execution stopped; {d}halted{z}");
                self.state = ExecState::Halted;
                return Ok(false);
            }
            Err(fault) => return Err(self.trap(fault)),
        }
        Ok(true)
    }

    /// Executes the program until it halts or faults.
    pub fn run(&mut self) -> Result<(), Trap> {
        while self.step()? {}
        Ok(())
    }
}
