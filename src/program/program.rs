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

use core::fmt::{self, Display, Formatter};

use super::segs::check_code_len;
use super::{DataSeg, Label, LabelTable, SegmentError};
use crate::isa::{DataRef, Instr, Pos};

/// A program executable by the machine: code segment, read-only data segment and the symbol
/// table produced by the assembler.
///
/// Programs are immutable once loaded into a [`crate::Vm`]; the same program may be run any
/// number of times.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Program {
    /// Instructions, addressed by their [`Pos`].
    code: Vec<Instr>,

    /// NUL-terminated literals.
    data: DataSeg,

    /// Labels known to the program. Programs loaded from a binary image have no labels.
    labels: LabelTable,
}

impl Program {
    /// Constructs empty program.
    #[inline]
    pub fn new() -> Self { default!() }

    /// Constructs program from its segments.
    ///
    /// # Errors
    ///
    /// Errors with [`SegmentError::CodeSegmentTooLarge`] if the code does not fit code segment.
    pub fn with(code: Vec<Instr>, data: DataSeg, labels: LabelTable) -> Result<Self, SegmentError> {
        check_code_len(code.len())?;
        Ok(Program { code, data, labels })
    }

    #[inline]
    pub fn code(&self) -> &[Instr] { &self.code }

    #[inline]
    pub fn data(&self) -> &DataSeg { &self.data }

    #[inline]
    pub fn labels(&self) -> &LabelTable { &self.labels }

    /// Returns instruction at a given position, if any.
    #[inline]
    pub fn instr(&self, pos: Pos) -> Option<Instr> { self.code.get(pos as usize).copied() }

    /// Returns location marked by a label.
    #[inline]
    pub fn label(&self, name: &str) -> Option<Label> { self.labels.get(name) }

    /// Returns position of the next instruction to be added.
    pub fn next_pos(&self) -> Result<Pos, SegmentError> {
        Pos::try_from(self.code.len()).map_err(|_| SegmentError::CodeSegmentTooLarge(self.code.len() + 1))
    }

    /// Appends an instruction to the code segment.
    ///
    /// # Returns
    ///
    /// Position of the added instruction.
    pub fn add_instr(&mut self, instr: Instr) -> Result<Pos, SegmentError> {
        let pos = self.next_pos()?;
        check_code_len(self.code.len() + 1)?;
        self.code.push(instr);
        Ok(pos)
    }

    /// Appends a literal to the data segment, terminating it with NUL.
    pub fn add_data(&mut self, literal: impl AsRef<[u8]>) -> Result<DataRef, SegmentError> {
        self.data.push_literal(literal.as_ref())
    }

    /// Adds a label to the symbol table.
    pub fn add_label(&mut self, name: impl Into<String>, label: Label) -> Result<(), SegmentError> {
        self.labels.insert(name, label)
    }

    /// Describes code position using the closest preceding label, if known.
    pub fn describe(&self, pos: Pos) -> String {
        match self.labels.locate(pos) {
            Some((name, 0)) => format!("{pos:04x}.h ({name})"),
            Some((name, offset)) => format!("{pos:04x}.h ({name}+{offset})"),
            None => format!("{pos:04x}.h"),
        }
    }
}

/// Displays a disassembly listing of the program.
impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "; code: {} instruction(s)", self.code.len())?;
        for (pos, instr) in self.code.iter().enumerate() {
            let pos = pos as Pos;
            for name in self.labels.code_labels(pos) {
                writeln!(f, "{name}:")?;
            }
            writeln!(f, "    {pos:04x}  {instr}")?;
        }

        writeln!(f, "; data: {} byte(s)", self.data.len())?;
        for (name, label) in &self.labels {
            if let Label::Data(data) = *label {
                let text = self
                    .data
                    .literal(data)
                    .map(String::from_utf8_lossy)
                    .unwrap_or_default();
                writeln!(f, "{name}:")?;
                writeln!(f, "    {:04x}  {text:?}", data.offset)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::RegIdx;

    #[test]
    fn builder() {
        let mut program = Program::new();
        let msg = program.add_data("Hello").unwrap();
        assert_eq!(program.add_instr(Instr::Set { val: 0 }), Ok(0));
        assert_eq!(program.add_instr(Instr::CopyCodeMemory { data: msg }), Ok(1));
        assert_eq!(program.add_instr(Instr::Halt), Ok(2));
        program.add_label("main", Label::Code(0)).unwrap();
        program.add_label("msg", Label::Data(msg)).unwrap();

        assert_eq!(program.code().len(), 3);
        assert_eq!(program.instr(2), Some(Instr::Halt));
        assert_eq!(program.instr(3), None);
        assert_eq!(program.label("msg"), Some(Label::Data(DataRef::new(0, 6))));
        assert_eq!(program.label("nope"), None);
        assert_eq!(program.add_label("main", Label::Code(1)), Err(SegmentError::DuplicateLabel(s!("main"))));
    }

    #[test]
    fn describe() {
        let mut program = Program::new();
        program.add_instr(Instr::Nop).unwrap();
        assert_eq!(program.describe(0), "0000.h");
        program.add_label("start", Label::Code(0)).unwrap();
        assert_eq!(program.describe(0), "0000.h (start)");
        assert_eq!(program.describe(2), "0002.h (start+2)");
    }

    #[test]
    fn listing() {
        let mut program = Program::new();
        let msg = program.add_data("Hi").unwrap();
        program.add_instr(Instr::Swap { reg: RegIdx::R1 }).unwrap();
        program.add_label("start", Label::Code(0)).unwrap();
        program.add_label("msg", Label::Data(msg)).unwrap();
        let listing = program.to_string();
        assert!(listing.contains("start:\n    0000  swap 1\n"));
        assert!(listing.contains("msg:\n    0000  \"Hi\"\n"));
    }

    #[test]
    fn code_limit() {
        let code = vec![Instr::Nop; u16::MAX as usize + 1];
        assert_eq!(
            Program::with(code, none!(), none!()),
            Err(SegmentError::CodeSegmentTooLarge(u16::MAX as usize + 1))
        );
    }
}
