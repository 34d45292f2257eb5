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

use core::convert::Infallible;
use core::fmt::{self, Debug, Formatter};

use crate::isa::{BytecodeRead, BytecodeWrite, CodeEofError};

/// Marshals instructions to and from bytecode representation.
pub struct Marshaller<C>
where C: AsRef<[u8]>
{
    pos: usize,
    bytecode: C,
}

impl<C> Debug for Marshaller<C>
where C: AsRef<[u8]>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let hex = self
            .bytecode
            .as_ref()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        f.debug_struct("Marshaller")
            .field("bytecode", &hex)
            .field("pos", &self.pos)
            .finish()
    }
}

impl Default for Marshaller<Vec<u8>> {
    fn default() -> Self { Marshaller::new() }
}

impl Marshaller<Vec<u8>> {
    /// Creates a new marshaller for writing.
    #[inline]
    pub fn new() -> Self { Self { bytecode: default!(), pos: 0 } }

    /// Completes marshalling, returning produced bytecode.
    #[inline]
    pub fn finish(self) -> Vec<u8> { self.bytecode }
}

impl<C> Marshaller<C>
where C: AsRef<[u8]>
{
    /// Creates marshaller reading from the provided bytecode.
    #[inline]
    pub fn with(bytecode: C) -> Self { Self { bytecode, pos: 0 } }

    /// Returns bytes which were not read yet.
    pub fn remaining(&self) -> &[u8] { &self.bytecode.as_ref()[self.pos..] }

    /// Reads `len` bytes as a slice.
    pub fn read_slice(&mut self, len: usize) -> Result<&[u8], CodeEofError> {
        let end = self.pos.checked_add(len).ok_or(CodeEofError)?;
        let slice = self
            .bytecode
            .as_ref()
            .get(self.pos..end)
            .ok_or(CodeEofError)?;
        self.pos = end;
        Ok(slice)
    }
}

impl<C> BytecodeRead for Marshaller<C>
where C: AsRef<[u8]>
{
    #[inline]
    fn pos(&self) -> usize { self.pos }

    #[inline]
    fn is_eof(&self) -> bool { self.pos >= self.bytecode.as_ref().len() }

    fn read_byte(&mut self) -> Result<u8, CodeEofError> {
        let byte = *self
            .bytecode
            .as_ref()
            .get(self.pos)
            .ok_or(CodeEofError)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_fixed<N, const LEN: usize>(&mut self, f: impl FnOnce([u8; LEN]) -> N) -> Result<N, CodeEofError> {
        let mut buf = [0u8; LEN];
        buf.copy_from_slice(self.read_slice(LEN)?);
        Ok(f(buf))
    }
}

impl BytecodeWrite for Marshaller<Vec<u8>> {
    type Error = Infallible;

    fn write_byte(&mut self, data: u8) -> Result<(), Self::Error> {
        self.bytecode.push(data);
        self.pos += 1;
        Ok(())
    }

    fn write_fixed<const LEN: usize>(&mut self, data: [u8; LEN]) -> Result<(), Self::Error> {
        self.bytecode.extend_from_slice(&data);
        self.pos += LEN;
        Ok(())
    }
}
