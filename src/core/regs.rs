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

/// Number of side registers in the register file.
pub const SIDE_REGS: usize = 4;

/// Index of a side register as it is written in the program.
///
/// Any byte value can be encoded into an instruction; only `0..=3` address a register, and the
/// rest fault with [`crate::Fault::InvalidRegister`] at the moment they are used.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display, From)]
#[display(inner)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct RegIdx(#[from] u8);

impl RegIdx {
    /// Side register 0.
    pub const R0: RegIdx = RegIdx(0);
    /// Side register 1.
    pub const R1: RegIdx = RegIdx(1);
    /// Side register 2.
    pub const R2: RegIdx = RegIdx(2);
    /// Side register 3.
    pub const R3: RegIdx = RegIdx(3);

    #[inline]
    pub const fn new(idx: u8) -> Self { RegIdx(idx) }

    #[inline]
    pub const fn to_u8(self) -> u8 { self.0 }

    /// Position of the register inside the register file, or `None` if the index does not
    /// address any side register.
    #[inline]
    pub fn pos(self) -> Option<usize> {
        let pos = self.0 as usize;
        (pos < SIDE_REGS).then_some(pos)
    }
}

/// Register-like locations which instructions read and modify. Used for execution tracing.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Reg {
    /// Main (accumulator) register.
    Main,
    /// Side register.
    Side(RegIdx),
    /// Condition code.
    Cc,
    /// Top of the call stack.
    Stack,
}

impl Display for Reg {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Reg::Main => f.write_str("a"),
            Reg::Side(idx) => write!(f, "r{idx}"),
            Reg::Cc => f.write_str("cc"),
            Reg::Stack => f.write_str("sp"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reg_idx_pos() {
        assert_eq!(RegIdx::R0.pos(), Some(0));
        assert_eq!(RegIdx::R3.pos(), Some(3));
        assert_eq!(RegIdx::new(4).pos(), None);
        assert_eq!(RegIdx::new(0xFF).pos(), None);
    }

    #[test]
    fn reg_display() {
        assert_eq!(Reg::Main.to_string(), "a");
        assert_eq!(Reg::Side(RegIdx::R2).to_string(), "r2");
        assert_eq!(Reg::Cc.to_string(), "cc");
    }
}
