//! # WCPU
//!
//! A minimal virtual CPU: a fetch-decode-execute interpreter over a flat
//! word-addressed memory, with a seven-instruction set and a register file
//! of sixteen general-purpose registers plus a program counter.

pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Wcpu, CpuState, CpuError, ErrorFlags, Memory, Registers, Instruction, Opcode};
pub use cpu::decode::{encode, decode};
pub use asm::{disassemble, ProgramBuilder, sample_program};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
