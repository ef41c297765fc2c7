//! Program construction and disassembly for WCPU programs.
//!
//! This module provides:
//! - The word-encoding helper and a program builder
//! - The built-in sample program
//! - A disassembler (words → readable text)

pub mod disasm;
pub mod program;

pub use disasm::disassemble;
pub use program::{opcode_with_values, sample_program, ProgramBuilder, SAMPLE_MEMORY_SIZE};
