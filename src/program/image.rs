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

//! Binary program image: the assembled program serialized into bytes.
//!
//! Layout: magic `ACVM`, version byte, number of instructions (16-bit word), instructions encoded
//! with [`Bytecode`], data segment length (16-bit word) and data segment bytes. All words are
//! little-endian. Labels are not preserved.

use core::convert::Infallible;

use super::constants::{IMAGE_MAGIC, IMAGE_VERSION};
use super::{DataSeg, LabelTable, Marshaller, Program, SegmentError};
use crate::isa::{Bytecode, BytecodeRead, BytecodeWrite, CodeEofError, Instr};

/// Errors reading binary program image.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ImageError {
    /// program image does not start with the `ACVM` magic bytes.
    NoMagic,

    /// unsupported program image version {0}.
    Version(u8),

    /// program image is truncated.
    #[from(CodeEofError)]
    Truncated,

    /// program image contains {0} unexpected trailing byte(s).
    TrailingData(usize),

    /// program image segments are invalid.
    #[display(inner)]
    #[from]
    Segment(SegmentError),
}

fn complete<T>(res: Result<T, Infallible>) -> T {
    match res {
        Ok(val) => val,
        Err(never) => match never {},
    }
}

impl Program {
    /// Serializes program into a binary image.
    pub fn to_image(&self) -> Vec<u8> {
        let mut writer = Marshaller::new();
        complete(writer.write_fixed(IMAGE_MAGIC));
        complete(writer.write_byte(IMAGE_VERSION));
        // code segment length is bound by `CODE_SEGMENT_MAX_LEN`
        complete(writer.write_word(self.code().len() as u16));
        for instr in self.code() {
            complete(instr.encode_instr(&mut writer));
        }
        complete(writer.write_word(self.data().len() as u16));
        for byte in self.data().as_slice() {
            complete(writer.write_byte(*byte));
        }
        writer.finish()
    }

    /// Deserializes program from a binary image.
    ///
    /// Opcodes not known to the machine are loaded as [`Instr::Reserved`] and fault only when
    /// executed.
    pub fn from_image(image: impl AsRef<[u8]>) -> Result<Self, ImageError> {
        let mut reader = Marshaller::with(image.as_ref());

        let magic = reader.read_fixed(|magic: [u8; 4]| magic)?;
        if magic != IMAGE_MAGIC {
            return Err(ImageError::NoMagic);
        }
        let version = reader.read_byte()?;
        if version != IMAGE_VERSION {
            return Err(ImageError::Version(version));
        }

        let count = reader.read_word()?;
        let code = (0..count)
            .map(|_| Instr::decode_instr(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        let len = reader.read_word()? as usize;
        let data = DataSeg::try_from_slice(reader.read_slice(len)?)?;

        if !reader.is_eof() {
            return Err(ImageError::TrailingData(reader.remaining().len()));
        }

        Ok(Program::with(code, data, LabelTable::new())?)
    }
}
