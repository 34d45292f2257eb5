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

use core::fmt::{self, Debug, Formatter};

use super::Fault;
use crate::isa::DataRef;

/// Address at which the read-only data segment is mapped.
pub const RODATA_BASE: u32 = 0x4000_0000;

/// Maximal size of the mutable memory region. The region must not overlap the data segment.
pub const MEMORY_SIZE_MAX: u32 = RODATA_BASE;

/// Default size of the mutable memory region.
pub const DEFAULT_MEMORY_SIZE: u32 = 4096;

/// Byte-addressable machine memory.
///
/// Consists of a zero-initialized mutable region occupying addresses `0..capacity` and the
/// program data segment mapped read-only starting from [`RODATA_BASE`]. Any other address is
/// unmapped. Multi-byte words are little-endian.
#[derive(Clone, Eq, PartialEq)]
pub struct Memory<'p> {
    ram: Box<[u8]>,
    rodata: &'p [u8],
}

impl<'p> Memory<'p> {
    /// Allocates mutable region of `size` bytes (capped at [`MEMORY_SIZE_MAX`]) and maps `rodata`
    /// as the read-only data segment.
    pub fn new(size: u32, rodata: &'p [u8]) -> Self {
        let size = size.min(MEMORY_SIZE_MAX) as usize;
        Memory { ram: vec![0u8; size].into_boxed_slice(), rodata }
    }

    /// Size of the mutable region.
    #[inline]
    pub fn capacity(&self) -> u32 { self.ram.len() as u32 }

    /// Contents of the mutable region.
    #[inline]
    pub fn ram(&self) -> &[u8] { &self.ram }

    /// Contents of the read-only data segment.
    #[inline]
    pub fn rodata(&self) -> &'p [u8] { self.rodata }

    /// Checks whether the address falls into the mapped read-only data segment.
    pub fn is_rodata(&self, addr: u32) -> bool {
        addr >= RODATA_BASE && ((addr - RODATA_BASE) as usize) < self.rodata.len()
    }

    /// Returns all readable bytes starting at `addr` up to the end of the region containing it.
    fn tail(&self, addr: u32) -> Result<&[u8], Fault> {
        if addr < self.capacity() {
            return Ok(&self.ram[addr as usize..]);
        }
        if self.is_rodata(addr) {
            return Ok(&self.rodata[(addr - RODATA_BASE) as usize..]);
        }
        Err(Fault::OutOfBounds(addr))
    }

    fn slice(&self, addr: u32, len: usize) -> Result<&[u8], Fault> {
        self.tail(addr)?
            .get(..len)
            .ok_or(Fault::OutOfBounds(addr))
    }

    fn slice_mut(&mut self, addr: u32, len: usize) -> Result<&mut [u8], Fault> {
        if self.is_rodata(addr) {
            return Err(Fault::ReadOnlyViolation(addr));
        }
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(Fault::OutOfBounds(addr))?;
        self.ram
            .get_mut(start..end)
            .ok_or(Fault::OutOfBounds(addr))
    }

    pub fn read_byte(&self, addr: u32) -> Result<u8, Fault> { Ok(self.slice(addr, 1)?[0]) }

    pub fn write_byte(&mut self, addr: u32, val: u8) -> Result<(), Fault> {
        self.slice_mut(addr, 1)?[0] = val;
        Ok(())
    }

    /// Reads little-endian 32-bit word at `addr`. All four bytes must belong to the same region.
    pub fn read_word32(&self, addr: u32) -> Result<i32, Fault> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.slice(addr, 4)?);
        Ok(i32::from_le_bytes(buf))
    }

    /// Writes little-endian 32-bit word at `addr`.
    pub fn write_word32(&mut self, addr: u32, val: i32) -> Result<(), Fault> {
        self.slice_mut(addr, 4)?
            .copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    /// Reads NUL-terminated string starting at `addr`, returning its bytes without the
    /// terminator. Faults if no terminator is found before the end of the region.
    pub fn read_cstr(&self, addr: u32) -> Result<&[u8], Fault> {
        let tail = self.tail(addr)?;
        let len = tail
            .iter()
            .position(|byte| *byte == 0)
            .ok_or_else(|| Fault::OutOfBounds(addr.saturating_add(tail.len() as u32)))?;
        Ok(&tail[..len])
    }

    /// Copies data segment literal (including its terminating NUL) into the mutable region
    /// starting at `dst`.
    pub fn copy_rodata(&mut self, src: DataRef, dst: u32) -> Result<(), Fault> {
        let rodata = self.rodata;
        let bytes = rodata
            .get(src.range())
            .ok_or(Fault::OutOfBounds(src.addr()))?;
        self.slice_mut(dst, bytes.len())?
            .copy_from_slice(bytes);
        Ok(())
    }
}

impl Debug for Memory<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let used = self
            .ram
            .iter()
            .rposition(|byte| *byte != 0)
            .map(|pos| pos + 1)
            .unwrap_or_default();
        f.debug_struct("Memory")
            .field("capacity", &self.capacity())
            .field("ram", &&self.ram[..used])
            .field("rodata", &self.rodata)
            .finish()
    }
}
