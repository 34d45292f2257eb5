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

use super::{Core, Fault, Reg, RegIdx};

/// Microcode for the main and side registers.
impl Core {
    /// Read main register.
    #[inline]
    pub fn a(&self) -> i32 { self.a }

    /// Set main register to a value.
    #[inline]
    pub fn set_a(&mut self, val: i32) { self.a = val }

    /// Read side register.
    pub fn r(&self, idx: RegIdx) -> Result<i32, Fault> {
        let pos = idx.pos().ok_or(Fault::InvalidRegister(idx.to_u8()))?;
        Ok(self.r[pos])
    }

    /// Set side register to a value.
    pub fn set_r(&mut self, idx: RegIdx, val: i32) -> Result<(), Fault> {
        let pos = idx.pos().ok_or(Fault::InvalidRegister(idx.to_u8()))?;
        self.r[pos] = val;
        Ok(())
    }

    /// Exchange values of the main and a side register.
    pub fn swp(&mut self, idx: RegIdx) -> Result<(), Fault> {
        let pos = idx.pos().ok_or(Fault::InvalidRegister(idx.to_u8()))?;
        core::mem::swap(&mut self.a, &mut self.r[pos]);
        Ok(())
    }

    /// Sets main register and updates condition code with the same value.
    #[inline]
    pub fn put_a(&mut self, val: i32) {
        self.a = val;
        self.cc = val as i64;
    }

    /// Reads value of a register-like location, if it holds one.
    pub fn get(&self, reg: Reg) -> Option<i64> {
        match reg {
            Reg::Main => Some(self.a as i64),
            Reg::Side(idx) => self.r(idx).ok().map(i64::from),
            Reg::Cc => Some(self.cc),
            Reg::Stack => self.cs.last().copied().map(i64::from),
        }
    }
}

/// Microcode for flag registers.
impl Core {
    /// Read condition code.
    #[inline]
    pub fn cc(&self) -> i64 { self.cc }

    /// Set condition code.
    #[inline]
    pub fn set_cc(&mut self, cc: i64) { self.cc = cc }

    /// Return number of executed instructions.
    #[inline]
    pub fn cy(&self) -> u64 { self.cy }

    /// Accounts for one more executed instruction.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::StepLimit`] once the step limit is reached, without accounting.
    pub fn acc_step(&mut self) -> Result<(), Fault> {
        if let Some(lim) = self.cl() {
            if self.cy >= lim {
                return Err(Fault::StepLimit(lim));
            }
        }
        self.cy += 1;
        Ok(())
    }
}

/// Microcode for the call stack.
impl Core {
    /// Return size of the call stack.
    #[inline]
    pub fn cp(&self) -> usize { self.cs.len() }

    /// Return call stack contents, bottom first.
    #[inline]
    pub fn cs(&self) -> &[i32] { &self.cs }

    /// Push a value to the call stack.
    ///
    /// # Returns
    ///
    /// Size of the call stack after the push.
    pub fn push_cs(&mut self, val: i32) -> Result<usize, Fault> {
        if let Some(max) = self.cs_max() {
            if self.cs.len() >= max {
                return Err(Fault::StackOverflow(max));
            }
        }
        self.cs.push(val);
        Ok(self.cp())
    }

    /// Pops a call stack item.
    pub fn pop_cs(&mut self) -> Result<i32, Fault> { self.cs.pop().ok_or(Fault::StackUnderflow) }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::CoreConfig;

    #[test]
    fn side_regs() {
        let mut core = Core::new();
        core.set_r(RegIdx::R3, -5).unwrap();
        assert_eq!(core.r(RegIdx::R3), Ok(-5));
        assert_eq!(core.r(RegIdx::new(4)), Err(Fault::InvalidRegister(4)));
        assert_eq!(core.set_r(RegIdx::new(9), 1), Err(Fault::InvalidRegister(9)));
        core.set_a(7);
        core.swp(RegIdx::R3).unwrap();
        assert_eq!(core.a(), -5);
        assert_eq!(core.r(RegIdx::R3), Ok(7));
        assert_eq!(core.get(Reg::Side(RegIdx::new(4))), None);
    }

    #[test]
    fn put_a() {
        let mut core = Core::new();
        core.put_a(-3);
        assert_eq!(core.a(), -3);
        assert_eq!(core.cc(), -3);
    }

    #[test]
    fn call_stack() {
        let mut core = Core::with(CoreConfig { call_stack_max: Some(2), ..default!() });
        assert_eq!(core.pop_cs(), Err(Fault::StackUnderflow));
        assert_eq!(core.push_cs(1), Ok(1));
        assert_eq!(core.push_cs(2), Ok(2));
        assert_eq!(core.push_cs(3), Err(Fault::StackOverflow(2)));
        assert_eq!(core.get(Reg::Stack), Some(2));
        assert_eq!(core.pop_cs(), Ok(2));
        assert_eq!(core.pop_cs(), Ok(1));
        assert_eq!(core.cp(), 0);
    }

    #[test]
    fn step_limit() {
        let mut core = Core::with(CoreConfig { step_limit: Some(2), ..default!() });
        assert_eq!(core.acc_step(), Ok(()));
        assert_eq!(core.acc_step(), Ok(()));
        assert_eq!(core.acc_step(), Err(Fault::StepLimit(2)));
        assert_eq!(core.cy(), 2);
    }
}
