//! CPU emulation for the WCPU.
//!
//! This module implements the complete machine:
//! - a flat memory of signed 32-bit words
//! - 16 general-purpose registers plus the program counter (register 16)
//! - a 7-instruction set packed as `|OPERAND1|OPERAND2|OPCODE|`

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Registers, RegisterError};
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Wcpu, CpuError, CpuState, ErrorFlags};
