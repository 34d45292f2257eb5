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

//! Host system calls.

use std::io::{self, Write};

use crate::core::{Core, Fault, Memory};

/// Host environment receiving output of the system calls.
pub trait Host {
    /// Outputs string bytes (without the NUL terminator) followed by a newline.
    fn print_str(&mut self, s: &[u8]) -> io::Result<()>;

    /// Outputs decimal representation of a signed number, without a newline.
    fn print_num(&mut self, val: i32) -> io::Result<()>;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn print_str(&mut self, s: &[u8]) -> io::Result<()> { (**self).print_str(s) }

    fn print_num(&mut self, val: i32) -> io::Result<()> { (**self).print_num(val) }
}

/// Host writing system call output into a [`Write`] stream, flushing it after each call.
#[derive(Debug)]
pub struct StdHost<W: Write = io::Stdout> {
    writer: W,
}

impl StdHost {
    /// Host writing to the process standard output.
    pub fn stdout() -> Self { StdHost { writer: io::stdout() } }
}

impl<W: Write> StdHost<W> {
    pub fn new(writer: W) -> Self { StdHost { writer } }

    pub fn writer(&self) -> &W { &self.writer }

    pub fn into_inner(self) -> W { self.writer }
}

impl<W: Write> Host for StdHost<W> {
    fn print_str(&mut self, s: &[u8]) -> io::Result<()> {
        self.writer.write_all(s)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn print_num(&mut self, val: i32) -> io::Result<()> {
        write!(self.writer, "{val}")?;
        self.writer.flush()
    }
}

/// System calls understood by the machine.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[repr(u8)]
pub enum Syscall {
    /// Print NUL-terminated string at the address in the main register, followed by a newline.
    #[display("print_str")]
    PrintStr = 0,

    /// Print the main register as a signed decimal number.
    #[display("print_num")]
    PrintNum = 1,
}

impl TryFrom<u8> for Syscall {
    type Error = Fault;

    fn try_from(no: u8) -> Result<Self, Self::Error> {
        match no {
            0 => Ok(Syscall::PrintStr),
            1 => Ok(Syscall::PrintNum),
            _ => Err(Fault::InvalidSyscall(no)),
        }
    }
}

impl Syscall {
    /// Performs the system call against the current machine state.
    pub fn dispatch<H: Host>(self, core: &Core, memory: &Memory, host: &mut H) -> Result<(), Fault> {
        match self {
            Syscall::PrintStr => {
                let s = memory.read_cstr(core.a() as u32)?;
                host.print_str(s)?;
            }
            Syscall::PrintNum => host.print_num(core.a())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> { Err(io::ErrorKind::BrokenPipe.into()) }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn numbers() {
        let mut host = StdHost::new(Vec::<u8>::new());
        let memory = Memory::new(0, &[]);
        let mut core = Core::new();
        for val in [5, -1, i32::MIN] {
            core.set_a(val);
            Syscall::PrintNum.dispatch(&core, &memory, &mut host).unwrap();
        }
        assert_eq!(host.into_inner(), b"5-1-2147483648");
    }

    #[test]
    fn strings() {
        let mut host = StdHost::new(Vec::<u8>::new());
        let mut memory = Memory::new(8, b"ok\0");
        memory.write_byte(0, b'a').unwrap();
        let core = Core::new();
        Syscall::PrintStr.dispatch(&core, &memory, &mut host).unwrap();
        assert_eq!(host.writer(), b"a\n");

        let mut core = Core::new();
        core.set_a(crate::RODATA_BASE as i32);
        Syscall::PrintStr.dispatch(&core, &memory, &mut host).unwrap();
        assert_eq!(host.writer(), b"a\nok\n");
    }

    #[test]
    fn unknown() {
        assert_eq!(Syscall::try_from(0), Ok(Syscall::PrintStr));
        assert_eq!(Syscall::try_from(1), Ok(Syscall::PrintNum));
        assert_eq!(Syscall::try_from(2), Err(Fault::InvalidSyscall(2)));
    }

    #[test]
    fn io_failure() {
        let mut host = StdHost::new(BrokenPipe);
        let memory = Memory::new(0, &[]);
        assert_eq!(
            Syscall::PrintNum.dispatch(&Core::new(), &memory, &mut host),
            Err(Fault::HostIo(io::ErrorKind::BrokenPipe))
        );
    }
}
