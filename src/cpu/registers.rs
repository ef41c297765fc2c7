//! WCPU register file.
//!
//! Sixteen general-purpose 32-bit registers, addressed 0-15, and the
//! program counter. Operand bytes can name any index up to 255, so the
//! file resolves them explicitly:
//! - 0-15: general-purpose registers
//! - 16: the program counter (writing it is a jump)
//! - 17-255: rejected with [`RegisterError::InvalidIndex`]

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 16;

/// Register index that aliases the program counter.
pub const PROGRAM_COUNTER: u8 = REGISTER_COUNT as u8;

/// The WCPU register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// General-purpose registers r0-r15.
    pub general: [i32; REGISTER_COUNT],

    /// Program counter: address of the next instruction to fetch.
    pub pc: i32,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            general: [0; REGISTER_COUNT],
            pc: 0,
        }
    }

    /// Read register `index`.
    pub fn get(&self, index: u8) -> Result<i32, RegisterError> {
        match index {
            PROGRAM_COUNTER => Ok(self.pc),
            _ => self
                .general
                .get(index as usize)
                .copied()
                .ok_or(RegisterError::InvalidIndex(index)),
        }
    }

    /// Write register `index`.
    pub fn set(&mut self, index: u8, value: i32) -> Result<(), RegisterError> {
        *self.slot_mut(index)? = value;
        Ok(())
    }

    /// Add an unsigned byte to register `index`, wrapping on overflow.
    pub fn add_immediate(&mut self, index: u8, value: u8) -> Result<(), RegisterError> {
        add_byte(self.slot_mut(index)?, value);
        Ok(())
    }

    /// Increment the program counter by 1.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> i32 {
        let old = self.pc;
        add_byte(&mut self.pc, 1);
        old
    }

    fn slot_mut(&mut self, index: u8) -> Result<&mut i32, RegisterError> {
        match index {
            PROGRAM_COUNTER => Ok(&mut self.pc),
            _ => self
                .general
                .get_mut(index as usize)
                .ok_or(RegisterError::InvalidIndex(index)),
        }
    }
}

/// Wrapping add of an unsigned byte; shared by ADQ and the PC advance.
fn add_byte(slot: &mut i32, value: u8) {
    *slot = slot.wrapping_add(value as i32);
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (0 to 16)")]
    InvalidIndex(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut regs = Registers::new();

        regs.set(3, -7).unwrap();
        assert_eq!(regs.get(3).unwrap(), -7);
        assert_eq!(regs.get(15).unwrap(), 0);
    }

    #[test]
    fn test_program_counter_alias() {
        let mut regs = Registers::new();

        regs.set(PROGRAM_COUNTER, 42).unwrap();
        assert_eq!(regs.pc, 42);
        assert_eq!(regs.get(PROGRAM_COUNTER).unwrap(), 42);
    }

    #[test]
    fn test_invalid_index() {
        let mut regs = Registers::new();

        assert_eq!(regs.get(17), Err(RegisterError::InvalidIndex(17)));
        assert_eq!(regs.set(255, 1), Err(RegisterError::InvalidIndex(255)));
        assert_eq!(regs.add_immediate(200, 1), Err(RegisterError::InvalidIndex(200)));
        assert_eq!(regs, Registers::new());
    }

    #[test]
    fn test_add_immediate_wraps() {
        let mut regs = Registers::new();
        regs.general[0] = i32::MAX;

        regs.add_immediate(0, 1).unwrap();
        assert_eq!(regs.general[0], i32::MIN);

        regs.general[1] = 10;
        regs.add_immediate(1, 255).unwrap();
        assert_eq!(regs.general[1], 265);
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 10;

        let old = regs.advance_pc();
        assert_eq!(old, 10);
        assert_eq!(regs.pc, 11);
    }

    #[test]
    fn test_advance_pc_matches_adq_on_pc() {
        let mut via_advance = Registers::new();
        let mut via_adq = Registers::new();
        via_advance.pc = i32::MAX;
        via_adq.pc = i32::MAX;

        via_advance.advance_pc();
        via_adq.add_immediate(PROGRAM_COUNTER, 1).unwrap();

        assert_eq!(via_advance.pc, i32::MIN);
        assert_eq!(via_advance, via_adq);
    }
}
