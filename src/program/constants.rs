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

#![allow(missing_docs)]

/// Maximal number of instructions in the code segment. Every position must fit into
/// [`crate::isa::Pos`].
pub const CODE_SEGMENT_MAX_LEN: usize = u16::MAX as usize;

/// Maximal size of the data segment in bytes. Every literal must be addressable by
/// [`crate::isa::DataRef`].
pub const DATA_SEGMENT_MAX_LEN: usize = u16::MAX as usize;

pub const IMAGE_MAGIC: [u8; 4] = *b"ACVM";

pub const IMAGE_VERSION: u8 = 1;

pub const COMMENT_CHAR: char = '#';
pub const COMMENT_PREFIX: &str = "//";

pub const KEYWORD_LABEL: &str = "label";
pub const KEYWORD_DATA: &str = "dataString";
