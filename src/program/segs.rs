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

//! Data structures representing program segments.

use std::collections::{btree_map, BTreeMap};
use std::iter;

use amplify::confinement::SmallBlob;

use super::constants::{CODE_SEGMENT_MAX_LEN, DATA_SEGMENT_MAX_LEN};
use crate::isa::{DataRef, Pos};

/// Errors while constructing program segments.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum SegmentError {
    /// the size of the CODE segment is {0}, which exceeds `CODE_SEGMENT_MAX_LEN`.
    CodeSegmentTooLarge(usize),

    /// the size of the DATA segment is {0}, which exceeds `DATA_SEGMENT_MAX_LEN`.
    DataSegmentTooLarge(usize),

    /// label `{0}` is already defined.
    DuplicateLabel(String),
}

/// Read-only data segment: NUL-terminated literals laid out back to back.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct DataSeg(SmallBlob);

impl DataSeg {
    /// Constructs data segment from raw bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, SegmentError> {
        SmallBlob::try_from_iter(bytes.iter().copied())
            .map(Self)
            .map_err(|_| SegmentError::DataSegmentTooLarge(bytes.len()))
    }

    /// Returns number of bytes in the segment.
    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns whether the segment is empty.
    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    #[inline]
    pub fn as_slice(&self) -> &[u8] { self.0.as_slice() }

    /// Appends a literal followed by the NUL terminator.
    ///
    /// # Returns
    ///
    /// Reference to the appended literal, with the length including the terminator.
    pub fn push_literal(&mut self, literal: &[u8]) -> Result<DataRef, SegmentError> {
        let offset = self.len();
        let end = offset + literal.len() + 1;
        if end > DATA_SEGMENT_MAX_LEN {
            return Err(SegmentError::DataSegmentTooLarge(end));
        }
        for byte in literal.iter().copied().chain(iter::once(0)) {
            self.0
                .push(byte)
                .map_err(|_| SegmentError::DataSegmentTooLarge(end))?;
        }
        Ok(DataRef::new(offset as u16, (end - offset) as u16))
    }

    /// Returns the literal (without the terminator) referenced by `data`.
    pub fn literal(&self, data: DataRef) -> Option<&[u8]> {
        let bytes = self.as_slice().get(data.range())?;
        Some(bytes.strip_suffix(&[0]).unwrap_or(bytes))
    }
}

impl AsRef<[u8]> for DataSeg {
    fn as_ref(&self) -> &[u8] { self.as_slice() }
}

/// Location marked by a label.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub enum Label {
    /// Instruction position.
    #[display("{0:04x}.h")]
    Code(Pos),

    /// Data segment literal.
    #[display(inner)]
    Data(DataRef),
}

/// Symbol table mapping label names to the locations they mark.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct LabelTable(BTreeMap<String, Label>);

impl LabelTable {
    #[inline]
    pub fn new() -> Self { default!() }

    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Label> { self.0.get(name).copied() }

    /// Adds a label. Fails if a label with the same name is already present.
    pub fn insert(&mut self, name: impl Into<String>, label: Label) -> Result<(), SegmentError> {
        match self.0.entry(name.into()) {
            btree_map::Entry::Occupied(entry) => Err(SegmentError::DuplicateLabel(entry.key().clone())),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(label);
                Ok(())
            }
        }
    }

    pub fn iter(&self) -> btree_map::Iter<String, Label> { self.0.iter() }

    /// Returns names of the labels marking the instruction at `pos`.
    pub fn code_labels(&self, pos: Pos) -> impl Iterator<Item = &str> + '_ {
        self.0
            .iter()
            .filter(move |(_, label)| **label == Label::Code(pos))
            .map(|(name, _)| name.as_str())
    }

    /// Finds the closest code label at or before `pos`, returning its name and the distance
    /// from it.
    pub fn locate(&self, pos: Pos) -> Option<(&str, u16)> {
        self.0
            .iter()
            .filter_map(|(name, label)| match *label {
                Label::Code(at) if at <= pos => Some((name.as_str(), pos - at)),
                _ => None,
            })
            .min_by_key(|(_, offset)| *offset)
    }
}

impl<'a> IntoIterator for &'a LabelTable {
    type Item = (&'a String, &'a Label);
    type IntoIter = btree_map::Iter<'a, String, Label>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

/// Checks that the number of instructions fits the code segment.
pub(super) fn check_code_len(len: usize) -> Result<(), SegmentError> {
    if len > CODE_SEGMENT_MAX_LEN {
        return Err(SegmentError::CodeSegmentTooLarge(len));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literals() {
        let mut seg = DataSeg::default();
        assert!(seg.is_empty());
        let hello = seg.push_literal(b"hello").unwrap();
        let empty = seg.push_literal(b"").unwrap();
        assert_eq!(hello, DataRef::new(0, 6));
        assert_eq!(empty, DataRef::new(6, 1));
        assert_eq!(seg.as_slice(), b"hello\0\0");
        assert_eq!(seg.literal(hello), Some(&b"hello"[..]));
        assert_eq!(seg.literal(empty), Some(&b""[..]));
        assert_eq!(seg.literal(DataRef::new(6, 2)), None);
    }

    #[test]
    fn data_limit() {
        let mut seg = DataSeg::default();
        let big = vec![b'x'; DATA_SEGMENT_MAX_LEN - 1];
        seg.push_literal(&big).unwrap();
        assert_eq!(seg.len(), DATA_SEGMENT_MAX_LEN);
        assert_eq!(
            seg.push_literal(b""),
            Err(SegmentError::DataSegmentTooLarge(DATA_SEGMENT_MAX_LEN + 1))
        );
        assert_eq!(seg.len(), DATA_SEGMENT_MAX_LEN);
    }

    #[test]
    fn labels() {
        let mut labels = LabelTable::new();
        labels.insert("main", Label::Code(0)).unwrap();
        labels.insert("func", Label::Code(4)).unwrap();
        labels.insert("msg", Label::Data(DataRef::new(0, 3))).unwrap();
        assert_eq!(labels.insert("func", Label::Code(1)), Err(SegmentError::DuplicateLabel(s!("func"))));
        assert_eq!(labels.get("func"), Some(Label::Code(4)));
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.locate(6), Some(("func", 2)));
        assert_eq!(labels.locate(3), Some(("main", 3)));
        assert_eq!(labels.code_labels(4).collect::<Vec<_>>(), vec!["func"]);
    }
}
