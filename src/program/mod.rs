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

//! Programs: code and data segments, the assembler and the binary image format.

mod assembler;
pub mod constants;
mod image;
mod marshaller;
#[allow(clippy::module_inception)]
mod program;
mod segs;

pub use assembler::{AsmError, ResolutionError};
pub use image::ImageError;
pub use marshaller::Marshaller;
pub use program::Program;
pub use segs::{DataSeg, Label, LabelTable, SegmentError};
