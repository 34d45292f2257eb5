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

use std::io;

/// Machine faults: unrecoverable errors which terminate the program.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Fault {
    /// side register index {0} does not address any register.
    InvalidRegister(u8),

    /// memory access at address {0} is out of bounds.
    OutOfBounds(u32),

    /// attempt to write to the read-only data segment at address {0}.
    ReadOnlyViolation(u32),

    /// division by zero.
    DivideByZero,

    /// pop from an empty call stack.
    StackUnderflow,

    /// call stack depth limit of {0} items exceeded.
    StackOverflow(usize),

    /// opcode {0} does not correspond to any instruction.
    InvalidOpcode(u8),

    /// unknown system call number {0}.
    InvalidSyscall(u8),

    /// control transferred to position {0} outside of the code segment.
    CodeOutOfBounds(i64),

    /// step limit of {0} instructions reached.
    StepLimit(u64),

    /// host I/O failure during a system call ({0}).
    HostIo(io::ErrorKind),
}

impl From<io::Error> for Fault {
    fn from(err: io::Error) -> Self { Fault::HostIo(err.kind()) }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert!(Fault::DivideByZero.to_string().starts_with("division by zero"));
        assert!(Fault::InvalidRegister(7)
            .to_string()
            .contains("side register index 7"));
        assert_eq!(
            Fault::from(io::Error::from(io::ErrorKind::BrokenPipe)),
            Fault::HostIo(io::ErrorKind::BrokenPipe)
        );
    }
}
