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

use super::memory::{DEFAULT_MEMORY_SIZE, MEMORY_SIZE_MAX};
use super::regs::SIDE_REGS;

/// Default initial capacity of the call stack.
pub const CALL_STACK_CAPACITY: usize = 0x100;

/// Registers of the machine core.
#[derive(Clone, Eq, PartialEq)]
pub struct Core {
    /// Main register, the accumulator which all arithmetic and memory instructions use.
    pub(super) a: i32,

    /// Side registers, addressed by [`crate::RegIdx`].
    pub(super) r: [i32; SIDE_REGS],

    /// Condition code. Written by instructions producing a value in the main register and by
    /// `compare`; read by conditional jumps.
    pub(super) cc: i64,

    /// Call stack, shared between `call`/`return` and the `push`/`pop` family.
    ///
    /// # See also
    ///
    /// - [`Core::cs_max`] register
    pub(super) cs: Vec<i32>,

    /// Maximal call stack depth, if any.
    cs_max: Option<usize>,

    /// Counts number of executed instructions.
    pub(super) cy: u64,

    /// Step limit.
    ///
    /// If this register has a value set, once [`Core::cy`] reaches it the VM stops program
    /// execution with [`crate::Fault::StepLimit`].
    cl: Option<u64>,
}

/// Configuration for [`Core`] and [`crate::Memory`] initialization.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct CoreConfig {
    /// Size of the mutable memory region, in bytes. Values above [`MEMORY_SIZE_MAX`] are capped.
    pub memory_size: u32,
    /// Maximal depth of the call stack; unbounded if `None`.
    pub call_stack_max: Option<usize>,
    /// Maximal number of instructions to execute; unbounded if `None`.
    pub step_limit: Option<u64>,
}

impl Default for CoreConfig {
    /// Sets
    /// - [`CoreConfig::memory_size`] to [`DEFAULT_MEMORY_SIZE`],
    /// - [`CoreConfig::call_stack_max`] to `None`,
    /// - [`CoreConfig::step_limit`] to `None`.
    fn default() -> Self {
        CoreConfig { memory_size: DEFAULT_MEMORY_SIZE, call_stack_max: None, step_limit: None }
    }
}

impl CoreConfig {
    /// Memory size actually used by the machine, after capping to [`MEMORY_SIZE_MAX`].
    pub fn effective_memory_size(&self) -> u32 { self.memory_size.min(MEMORY_SIZE_MAX) }
}

impl Default for Core {
    fn default() -> Self { Core::new() }
}

impl Core {
    /// Initializes registers: main, side registers and condition code to zero, call stack to
    /// empty.
    ///
    /// An alias for [`Core::with`]`(`[`CoreConfig::default()`]`)`.
    #[inline]
    pub fn new() -> Self { Core::with(default!()) }

    /// Initializes registers using a configuration object [`CoreConfig`].
    pub fn with(config: CoreConfig) -> Self {
        let capacity = config
            .call_stack_max
            .unwrap_or(CALL_STACK_CAPACITY)
            .min(CALL_STACK_CAPACITY);
        Core {
            a: 0,
            r: [0; SIDE_REGS],
            cc: 0,
            cs: Vec::with_capacity(capacity),
            cs_max: config.call_stack_max,
            cy: 0,
            cl: config.step_limit,
        }
    }

    /// Return step limit value.
    pub fn cl(&self) -> Option<u64> { self.cl }

    /// Return the maximal call stack depth.
    pub fn cs_max(&self) -> Option<usize> { self.cs_max }
}

impl Debug for Core {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (sect, reg, val, reset) = if f.alternate() {
            ("\x1B[0;4;1m", "\x1B[0;1m", "\x1B[0;32m", "\x1B[0m")
        } else {
            ("", "", "", "")
        };

        writeln!(f, "{sect}Registers:{reset}")?;
        write!(f, "{reg}a{reset} {val}{}{reset}, ", self.a)?;
        for (no, r) in self.r.iter().enumerate() {
            write!(f, "{reg}r{no}{reset} {val}{r}{reset}, ")?;
        }
        writeln!(f, "{reg}cc{reset} {val}{}{reset}", self.cc)?;

        writeln!(f, "{sect}Control:{reset}")?;
        write!(f, "{reg}cy{reset} {val}{}{reset}, ", self.cy)?;
        let cl = self
            .cl
            .map(|v| v.to_string())
            .unwrap_or_else(|| "~".to_string());
        writeln!(f, "{reg}cl{reset} {val}{cl}{reset}")?;
        write!(f, "{reg}cs{reset} {val}")?;
        for item in &self.cs {
            write!(f, "{item}   ")?;
        }
        writeln!(f, "{reset}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn init() {
        let core = Core::new();
        assert_eq!(core.a, 0);
        assert_eq!(core.r, [0; SIDE_REGS]);
        assert_eq!(core.cc, 0);
        assert!(core.cs.is_empty());
        assert_eq!(core.cl(), None);
        assert_eq!(core.cs_max(), None);
    }

    #[test]
    fn config() {
        let config = CoreConfig { call_stack_max: Some(4), step_limit: Some(10), ..default!() };
        let core = Core::with(config);
        assert_eq!(core.cl(), Some(10));
        assert_eq!(core.cs_max(), Some(4));
        assert_eq!(config.effective_memory_size(), DEFAULT_MEMORY_SIZE);

        let config = CoreConfig { memory_size: u32::MAX, ..default!() };
        assert_eq!(config.effective_memory_size(), MEMORY_SIZE_MAX);
    }

    #[test]
    fn debug() {
        let mut core = Core::new();
        core.a = 5;
        core.cs.push(7);
        let s = format!("{core:?}");
        assert!(s.contains("a 5"));
        assert!(s.contains("cs 7"));
        assert!(s.contains("cl ~"));
    }
}
