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

//! Two-pass assembler for the line-oriented program text.
//!
//! # Syntax
//!
//! ```text
//! label <name>                 # marks the next instruction or data string
//! dataString <text>            # rest of the line is stored as a NUL-terminated literal
//! <mnemonic> <operand> ...     # whitespace-separated operands
//! ```
//!
//! - Lines starting with `#` or `//` are comments; `#` also starts a trailing comment after an
//!   instruction
//! - Integers are decimal, optionally negative, or hexadecimal with `0x` prefix
//! - Jump and call targets, as well as `copyCodeMemory` operands, are label names which may be
//!   defined anywhere in the text

use std::collections::BTreeMap;
use std::str::FromStr;

use super::constants::{COMMENT_CHAR, COMMENT_PREFIX, KEYWORD_DATA, KEYWORD_LABEL};
use super::{Label, Program, SegmentError};
use crate::core::RegIdx;
use crate::isa::{DataRef, Instr, Pos};

/// Errors resolving label references.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum ResolutionError {
    /// label `{label}` on line {line} is already defined on line {first}.
    Duplicate { label: String, line: usize, first: usize },

    /// label `{label}` used on line {line} is not defined.
    Undefined { label: String, line: usize },

    /// label `{label}` used on line {line} marks a data string, while an instruction is expected.
    ExpectedCode { label: String, line: usize },

    /// label `{label}` used on line {line} marks an instruction, while a data string is expected.
    ExpectedData { label: String, line: usize },
}

/// Errors assembling program text.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum AsmError {
    /// unknown instruction `{mnemonic}` on line {line}.
    UnknownMnemonic { mnemonic: String, line: usize },

    /// instruction `{mnemonic}` on line {line} takes {expected} operand(s), but {found} given.
    Arity { mnemonic: String, line: usize, expected: usize, found: usize },

    /// invalid integer `{literal}` on line {line}.
    InvalidInteger { literal: String, line: usize },

    /// integer `{literal}` on line {line} is out of range for {kind}.
    OutOfRange { literal: String, line: usize, kind: &'static str },

    /// invalid label name `{label}` on line {line}.
    InvalidLabel { label: String, line: usize },

    #[display(inner)]
    #[from]
    Resolution(ResolutionError),

    /// program on line {0} exceeds segment limits: {1}
    Segment(usize, SegmentError),
}

impl AsmError {
    /// Returns number of the source line (starting from 1) which caused the error.
    pub fn line(&self) -> usize {
        match self {
            AsmError::UnknownMnemonic { line, .. }
            | AsmError::Arity { line, .. }
            | AsmError::InvalidInteger { line, .. }
            | AsmError::OutOfRange { line, .. }
            | AsmError::InvalidLabel { line, .. }
            | AsmError::Segment(line, _) => *line,
            AsmError::Resolution(err) => match err {
                ResolutionError::Duplicate { line, .. }
                | ResolutionError::Undefined { line, .. }
                | ResolutionError::ExpectedCode { line, .. }
                | ResolutionError::ExpectedData { line, .. } => *line,
            },
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
enum Stmt<'s> {
    Label(&'s str),
    Data(&'s str),
    Op { mnemonic: &'s str, operands: Vec<&'s str> },
}

/// Parses a single line into a statement; comments and blank lines produce nothing.
fn parse_line(line: usize, text: &str) -> Result<Option<Stmt<'_>>, AsmError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with(COMMENT_CHAR) || text.starts_with(COMMENT_PREFIX) {
        return Ok(None);
    }

    let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    if head == KEYWORD_DATA {
        return Ok(Some(Stmt::Data(rest.trim_start())));
    }

    let code = match rest.find(COMMENT_CHAR) {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    let operands = code.split_whitespace().collect::<Vec<_>>();

    if head == KEYWORD_LABEL {
        return match operands[..] {
            [name] if is_label_name(name) => Ok(Some(Stmt::Label(name))),
            [name] => Err(AsmError::InvalidLabel { label: name.to_owned(), line }),
            _ => Err(AsmError::Arity {
                mnemonic: KEYWORD_LABEL.to_owned(),
                line,
                expected: 1,
                found: operands.len(),
            }),
        };
    }

    Ok(Some(Stmt::Op { mnemonic: head, operands }))
}

fn is_label_name(name: &str) -> bool {
    name.chars()
        .next()
        .map(|c| !c.is_ascii_digit() && c != '-' && c != '+')
        .unwrap_or_default()
}

/// Parses decimal or `0x`-prefixed hexadecimal integer, optionally preceded by a sign.
fn parse_int(literal: &str) -> Option<i64> {
    let (neg, digits) = match literal.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let val = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.starts_with(['+', '-']) => i64::from_str_radix(hex, 16).ok()?,
        Some(_) => return None,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if neg { -val } else { val })
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Binding {
    label: Label,
    line: usize,
}

/// Assembly context: label definitions collected during the first pass.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
struct AsmContext<'s> {
    labels: BTreeMap<&'s str, Binding>,
    pending: Vec<(&'s str, usize)>,
}

impl<'s> AsmContext<'s> {
    /// Binds all labels waiting for the next instruction or data string.
    fn bind_pending(&mut self, label: Label) -> Result<(), ResolutionError> {
        for (name, line) in self.pending.drain(..) {
            if let Some(first) = self.labels.get(name) {
                return Err(ResolutionError::Duplicate { label: name.to_owned(), line, first: first.line });
            }
            self.labels.insert(name, Binding { label, line });
        }
        Ok(())
    }

    fn resolve(&self, name: &str, line: usize) -> Result<Label, ResolutionError> {
        self.labels
            .get(name)
            .map(|binding| binding.label)
            .ok_or_else(|| ResolutionError::Undefined { label: name.to_owned(), line })
    }
}

/// Operands of a single instruction being translated.
struct Operands<'a, 's> {
    line: usize,
    mnemonic: &'s str,
    items: &'a [&'s str],
    ctx: &'a AsmContext<'s>,
}

impl<'a, 's> Operands<'a, 's> {
    fn arity(&self, expected: usize) -> Result<&Self, AsmError> {
        if self.items.len() != expected {
            return Err(AsmError::Arity {
                mnemonic: self.mnemonic.to_owned(),
                line: self.line,
                expected,
                found: self.items.len(),
            });
        }
        Ok(self)
    }

    fn int(&self, no: usize, min: i64, max: i64, kind: &'static str) -> Result<i64, AsmError> {
        let literal = self.items[no];
        let val = parse_int(literal)
            .ok_or_else(|| AsmError::InvalidInteger { literal: literal.to_owned(), line: self.line })?;
        if val < min || val > max {
            return Err(AsmError::OutOfRange { literal: literal.to_owned(), line: self.line, kind });
        }
        Ok(val)
    }

    /// Immediate value. Unsigned values above `i32::MAX` are taken as their two's complement.
    fn imm(&self, no: usize) -> Result<i32, AsmError> {
        self.int(no, i32::MIN as i64, u32::MAX as i64, "an immediate value")
            .map(|val| val as u32 as i32)
    }

    fn reg(&self, no: usize) -> Result<RegIdx, AsmError> {
        self.int(no, 0, u8::MAX as i64, "a register index")
            .map(|val| RegIdx::new(val as u8))
    }

    fn addr(&self, no: usize) -> Result<u32, AsmError> {
        self.int(no, 0, u32::MAX as i64, "a memory address")
            .map(|val| val as u32)
    }

    fn syscall(&self, no: usize) -> Result<u8, AsmError> {
        self.int(no, 0, u8::MAX as i64, "a system call number")
            .map(|val| val as u8)
    }

    fn code(&self, no: usize) -> Result<Pos, AsmError> {
        let name = self.items[no];
        match self.ctx.resolve(name, self.line)? {
            Label::Code(pos) => Ok(pos),
            Label::Data(_) => Err(ResolutionError::ExpectedCode { label: name.to_owned(), line: self.line }.into()),
        }
    }

    fn data(&self, no: usize) -> Result<DataRef, AsmError> {
        let name = self.items[no];
        match self.ctx.resolve(name, self.line)? {
            Label::Data(data) => Ok(data),
            Label::Code(_) => Err(ResolutionError::ExpectedData { label: name.to_owned(), line: self.line }.into()),
        }
    }

    fn translate(&self) -> Result<Instr, AsmError> {
        Ok(match self.mnemonic {
            "nop" => self.arity(0).map(|_| Instr::Nop)?,
            "halt" => self.arity(0).map(|_| Instr::Halt)?,
            "jump" => Instr::Jump { pos: self.arity(1)?.code(0)? },
            "jumpNonzero" | "jumpNotEqual" => Instr::JumpNonzero { pos: self.arity(1)?.code(0)? },
            "jumpZero" | "jumpEqual" => Instr::JumpZero { pos: self.arity(1)?.code(0)? },
            "jumpLess" => Instr::JumpLess { pos: self.arity(1)?.code(0)? },
            "jumpGreater" => Instr::JumpGreater { pos: self.arity(1)?.code(0)? },
            "jumpLessEqual" => Instr::JumpLessEqual { pos: self.arity(1)?.code(0)? },
            "jumpGreaterEqual" => Instr::JumpGreaterEqual { pos: self.arity(1)?.code(0)? },
            "call" => Instr::Call { pos: self.arity(1)?.code(0)? },
            "return" => self.arity(0).map(|_| Instr::Return)?,

            "set" => Instr::Set { val: self.arity(1)?.imm(0)? },
            "setRegister" => {
                self.arity(2)?;
                Instr::SetRegister { reg: self.reg(0)?, val: self.imm(1)? }
            }
            "swap" => Instr::Swap { reg: self.arity(1)?.reg(0)? },
            "increment" => self.arity(0).map(|_| Instr::Increment)?,
            "decrement" => self.arity(0).map(|_| Instr::Decrement)?,
            "incrementRegister" => Instr::IncrementRegister { reg: self.arity(1)?.reg(0)? },
            "decrementRegister" => Instr::DecrementRegister { reg: self.arity(1)?.reg(0)? },
            "add" => Instr::Add { reg: self.arity(1)?.reg(0)? },
            "sub" => Instr::Sub { reg: self.arity(1)?.reg(0)? },
            "div" => Instr::Div { reg: self.arity(1)?.reg(0)? },
            "compare" => Instr::Compare { reg: self.arity(1)?.reg(0)? },

            "write8" => Instr::Write8 { reg: self.arity(1)?.reg(0)? },
            "store8" => Instr::Store8 { addr: self.arity(1)?.addr(0)? },
            "store32" => Instr::Store32 { addr: self.arity(1)?.addr(0)? },
            "load8" => Instr::Load8 { addr: self.arity(1)?.addr(0)? },
            "load32" => Instr::Load32 { addr: self.arity(1)?.addr(0)? },
            "deref8" => Instr::Deref8 { reg: self.arity(1)?.reg(0)? },
            "deref32" => Instr::Deref32 { reg: self.arity(1)?.reg(0)? },
            "copyCodeMemory" => Instr::CopyCodeMemory { data: self.arity(1)?.data(0)? },

            "push" => self.arity(0).map(|_| Instr::Push)?,
            "pop" => self.arity(0).map(|_| Instr::Pop)?,
            "pushRegister" => Instr::PushRegister { reg: self.arity(1)?.reg(0)? },
            "popRegister" => Instr::PopRegister { reg: self.arity(1)?.reg(0)? },

            "syscall" => Instr::Syscall { no: self.arity(1)?.syscall(0)? },

            _ => {
                return Err(AsmError::UnknownMnemonic { mnemonic: self.mnemonic.to_owned(), line: self.line });
            }
        })
    }
}

impl Program {
    /// Assembles program text.
    ///
    /// The first pass lays out the data segment and binds every label to the instruction or data
    /// string following it; labels at the end of the text mark the end of the code segment. The
    /// second pass translates instructions, resolving label references.
    pub fn assemble(source: &str) -> Result<Program, AsmError> {
        let mut stmts = Vec::new();
        for (no, text) in source.lines().enumerate() {
            if let Some(stmt) = parse_line(no + 1, text)? {
                stmts.push((no + 1, stmt));
            }
        }

        let mut program = Program::new();
        let mut ctx = AsmContext::default();
        let mut code_len = 0usize;
        for (line, stmt) in &stmts {
            let line = *line;
            match stmt {
                Stmt::Label(name) => ctx.pending.push((*name, line)),
                Stmt::Data(text) => {
                    let data = program
                        .add_data(*text)
                        .map_err(|err| AsmError::Segment(line, err))?;
                    ctx.bind_pending(Label::Data(data))?;
                }
                Stmt::Op { .. } => {
                    let pos = Pos::try_from(code_len)
                        .map_err(|_| AsmError::Segment(line, SegmentError::CodeSegmentTooLarge(code_len + 1)))?;
                    ctx.bind_pending(Label::Code(pos))?;
                    code_len += 1;
                }
            }
        }
        let end = stmts.last().map(|(line, _)| *line).unwrap_or_default();
        let pos =
            Pos::try_from(code_len).map_err(|_| AsmError::Segment(end, SegmentError::CodeSegmentTooLarge(code_len)))?;
        ctx.bind_pending(Label::Code(pos))?;

        for (line, stmt) in &stmts {
            if let Stmt::Op { mnemonic, operands } = stmt {
                let ops = Operands { line: *line, mnemonic: *mnemonic, items: operands, ctx: &ctx };
                let instr = ops.translate()?;
                program
                    .add_instr(instr)
                    .map_err(|err| AsmError::Segment(*line, err))?;
            }
        }

        for (name, binding) in &ctx.labels {
            program
                .add_label(*name, binding.label)
                .map_err(|err| AsmError::Segment(binding.line, err))?;
        }

        Ok(program)
    }
}

impl FromStr for Program {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Program::assemble(s) }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lines() {
        assert_eq!(parse_line(1, "   "), Ok(None));
        assert_eq!(parse_line(1, "# comment"), Ok(None));
        assert_eq!(parse_line(1, "  // comment"), Ok(None));
        assert_eq!(parse_line(1, "label main"), Ok(Some(Stmt::Label("main"))));
        assert_eq!(parse_line(1, "dataString  Hello # world!\r"), Ok(Some(Stmt::Data("Hello # world!"))));
        assert_eq!(
            parse_line(1, "\tsetRegister 0 -5   # trailing"),
            Ok(Some(Stmt::Op { mnemonic: "setRegister", operands: vec!["0", "-5"] }))
        );
        assert_eq!(
            parse_line(3, "label 1st"),
            Err(AsmError::InvalidLabel { label: s!("1st"), line: 3 })
        );
        assert_eq!(
            parse_line(4, "label a b"),
            Err(AsmError::Arity { mnemonic: s!("label"), line: 4, expected: 1, found: 2 })
        );
    }

    #[test]
    fn integers() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-42"), Some(-42));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("0x10"), Some(16));
        assert_eq!(parse_int("-0XfF"), Some(-255));
        assert_eq!(parse_int("--1"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("0x-5"), None);
        assert_eq!(parse_int("ten"), None);
    }

    #[test]
    fn forward_and_backward_labels() {
        let program = Program::assemble(
            "label start\n\
             jump end\n\
             label middle\n\
             call start\n\
             label end\n\
             halt\n",
        )
        .unwrap();
        assert_eq!(program.code(), &[Instr::Jump { pos: 2 }, Instr::Call { pos: 0 }, Instr::Halt]);
        assert_eq!(program.label("middle"), Some(Label::Code(1)));
    }

    #[test]
    fn data_labels() {
        let program = Program::assemble(
            "label greeting\n\
             dataString Hello world!\n\
             label other\n\
             dataString  x y \n\
             set 0\n\
             copyCodeMemory other\n",
        )
        .unwrap();
        assert_eq!(program.data().as_slice(), b"Hello world!\0x y\0");
        assert_eq!(program.label("greeting"), Some(Label::Data(DataRef::new(0, 13))));
        assert_eq!(program.code()[1], Instr::CopyCodeMemory { data: DataRef::new(13, 4) });
    }

    #[test]
    fn several_labels_on_one_instruction() {
        let program = Program::assemble("label a\nlabel b\nnop\nlabel c\n").unwrap();
        assert_eq!(program.label("a"), Some(Label::Code(0)));
        assert_eq!(program.label("b"), Some(Label::Code(0)));
        assert_eq!(program.label("c"), Some(Label::Code(1)));
    }

    #[test]
    fn immediates() {
        let program = Program::assemble("set 0xFFFFFFFF\nset -2147483648\nsetRegister 3 0x7fffffff\n").unwrap();
        assert_eq!(program.code(), &[
            Instr::Set { val: -1 },
            Instr::Set { val: i32::MIN },
            Instr::SetRegister { reg: RegIdx::R3, val: i32::MAX }
        ]);
        assert!(matches!(
            Program::assemble("set 0x100000000"),
            Err(AsmError::OutOfRange { line: 1, .. })
        ));
        assert!(matches!(Program::assemble("\nadd 256"), Err(AsmError::OutOfRange { line: 2, .. })));
        assert!(matches!(Program::assemble("store8 -1"), Err(AsmError::OutOfRange { .. })));
    }

    #[test]
    fn errors() {
        assert_eq!(
            Program::assemble("jump nowhere"),
            Err(AsmError::Resolution(ResolutionError::Undefined { label: s!("nowhere"), line: 1 }))
        );
        assert_eq!(
            Program::assemble("label x\nnop\nlabel x\nhalt"),
            Err(AsmError::Resolution(ResolutionError::Duplicate { label: s!("x"), line: 3, first: 1 }))
        );
        assert_eq!(
            Program::assemble("label msg\ndataString hi\njump msg"),
            Err(AsmError::Resolution(ResolutionError::ExpectedCode { label: s!("msg"), line: 3 }))
        );
        assert_eq!(
            Program::assemble("label f\nnop\ncopyCodeMemory f"),
            Err(AsmError::Resolution(ResolutionError::ExpectedData { label: s!("f"), line: 3 }))
        );
        assert_eq!(
            Program::assemble("nop\nfly 1"),
            Err(AsmError::UnknownMnemonic { mnemonic: s!("fly"), line: 2 })
        );
        assert_eq!(
            Program::assemble("halt 1"),
            Err(AsmError::Arity { mnemonic: s!("halt"), line: 1, expected: 0, found: 1 })
        );
        assert_eq!(
            Program::assemble("set five"),
            Err(AsmError::InvalidInteger { literal: s!("five"), line: 1 })
        );
        assert_eq!(Program::assemble("nop\njump x").unwrap_err().line(), 2);
    }

    #[test]
    fn from_str() {
        let program: Program = "halt".parse().unwrap();
        assert_eq!(program.code(), &[Instr::Halt]);
        assert!(Program::from_str("").unwrap().code().is_empty());
    }
}
