//! WCPU memory subsystem.
//!
//! Memory is a fixed-size flat array of signed 32-bit words, addressed
//! by word index. It never grows and never wraps: any access outside
//! `[0, len)` is reported as an error.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Default memory size in words.
pub const RESERVED_MEMORY: usize = 1024;

/// WCPU memory: a fixed number of 32-bit words.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i32>,
}

impl Memory {
    /// Create a new memory of `size` words, all zeroed.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size],
        }
    }

    /// Create a memory holding a copy of `words`.
    pub fn from_words(words: &[i32]) -> Self {
        Self {
            cells: words.to_vec(),
        }
    }

    /// Create a zeroed memory of `size` words with `program` copied to address 0.
    pub fn with_program(program: &[i32], size: usize) -> Result<Self, MemoryError> {
        let mut mem = Self::new(size);
        mem.load_program(0, program)?;
        Ok(mem)
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the memory has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read the word at `addr`.
    #[inline]
    pub fn read(&self, addr: i32) -> Result<i32, MemoryError> {
        let index = self.index(addr)?;
        Ok(self.cells[index])
    }

    /// Write `value` to the word at `addr`.
    #[inline]
    pub fn write(&mut self, addr: i32, value: i32) -> Result<(), MemoryError> {
        let index = self.index(addr)?;
        self.cells[index] = value;
        Ok(())
    }

    /// Convert a word address to a cell index.
    fn index(&self, addr: i32) -> Result<usize, MemoryError> {
        usize::try_from(addr)
            .ok()
            .filter(|&index| index < self.cells.len())
            .ok_or(MemoryError::AddressOutOfRange {
                addr,
                size: self.cells.len(),
            })
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: usize, program: &[i32]) -> Result<(), MemoryError> {
        let available = self.cells.len().saturating_sub(start_addr);
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.cells[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Snapshot of every cell, in address order.
    pub fn dump(&self) -> Vec<(usize, i32)> {
        self.cells.iter().copied().enumerate().collect()
    }

    /// Borrow the raw words.
    pub fn as_slice(&self) -> &[i32] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(RESERVED_MEMORY)
    }
}

/// Console dump: one `index: XXXXXXXX` line per word.
impl std::fmt::Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, word) in self.cells.iter().enumerate() {
            writeln!(f, "{}: {:08X}", index, word)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&w| w != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {addr} out of range (0 to {size})")]
    AddressOutOfRange { addr: i32, size: usize },
    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
