//! Instruction encoding and decoding for the WCPU.
//!
//! Every instruction is one 32-bit word:
//!
//! ```text
//!  31      24 23      16 15               0
//! +----------+----------+------------------+
//! | operand1 | operand2 |      opcode      |
//! +----------+----------+------------------+
//! ```
//!
//! Only the low 16 bits identify the opcode; the operand bytes never
//! affect opcode recognition.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Mask selecting the opcode field of an instruction word.
pub const OPCODE_MASK: u32 = 0x0000_FFFF;

const OPERAND1_SHIFT: u32 = 24;
const OPERAND2_SHIFT: u32 = 16;

/// Pack an opcode and two operand bytes into an instruction word.
pub fn encode(opcode: u16, operand1: u8, operand2: u8) -> i32 {
    let word = (opcode as u32)
        | ((operand1 as u32) << OPERAND1_SHIFT)
        | ((operand2 as u32) << OPERAND2_SHIFT);
    word as i32
}

/// Split an instruction word into `(opcode, operand1, operand2)`.
pub fn decode(word: i32) -> (u16, u8, u8) {
    let bits = word as u32;
    let opcode = (bits & OPCODE_MASK) as u16;
    let operand1 = ((bits >> OPERAND1_SHIFT) & 0xFF) as u8;
    let operand2 = ((bits >> OPERAND2_SHIFT) & 0xFF) as u8;
    (opcode, operand1, operand2)
}

/// Opcode identifiers, as stored in the low 16 bits of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Opcode {
    Nop = 0,
    Hlt = 1,
    Ldm = 2,
    Ldq = 3,
    Wrm = 4,
    Add = 5,
    Adq = 6,
}

impl Opcode {
    /// All opcodes, in numeric order.
    pub const ALL: [Opcode; 7] = [
        Opcode::Nop,
        Opcode::Hlt,
        Opcode::Ldm,
        Opcode::Ldq,
        Opcode::Wrm,
        Opcode::Add,
        Opcode::Adq,
    ];

    /// Look up an opcode by its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Hlt => "HLT",
            Opcode::Ldm => "LDM",
            Opcode::Ldq => "LDQ",
            Opcode::Wrm => "WRM",
            Opcode::Add => "ADD",
            Opcode::Adq => "ADQ",
        }
    }
}

impl From<Opcode> for u16 {
    fn from(op: Opcode) -> u16 {
        op as u16
    }
}

/// Decoded WCPU instruction.
///
/// Register operands are raw indices; the register file decides whether
/// they are addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// No operation
    Nop,

    /// Halt execution
    Hlt,

    /// Load from memory: R[target] := M[R[source]]
    Ldm { source: u8, target: u8 },

    /// Load immediate: R[register] := value (zero-extended)
    Ldq { register: u8, value: u8 },

    /// Write to memory: M[R[location]] := R[value]
    Wrm { location: u8, value: u8 },

    /// Signed add: R[dest] := R[dest] + R[src] (wrapping)
    Add { dest: u8, src: u8 },

    /// Add immediate: R[register] := R[register] + value (wrapping)
    Adq { register: u8, value: u8 },
}

impl Instruction {
    /// Decode a memory word into an instruction.
    pub fn decode(word: i32) -> Result<Self, DecodeError> {
        let (raw, op1, op2) = decode(word);
        let opcode = Opcode::from_u16(raw).ok_or(DecodeError::UnknownOpcode(raw))?;

        let instruction = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::Hlt => Instruction::Hlt,
            Opcode::Ldm => Instruction::Ldm { source: op1, target: op2 },
            Opcode::Ldq => Instruction::Ldq { register: op1, value: op2 },
            Opcode::Wrm => Instruction::Wrm { location: op1, value: op2 },
            Opcode::Add => Instruction::Add { dest: op1, src: op2 },
            Opcode::Adq => Instruction::Adq { register: op1, value: op2 },
        };

        Ok(instruction)
    }

    /// Encode the instruction back to a memory word.
    pub fn encode(&self) -> i32 {
        let (op1, op2) = self.operands();
        encode(self.opcode().into(), op1, op2)
    }

    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Hlt => Opcode::Hlt,
            Instruction::Ldm { .. } => Opcode::Ldm,
            Instruction::Ldq { .. } => Opcode::Ldq,
            Instruction::Wrm { .. } => Opcode::Wrm,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Adq { .. } => Opcode::Adq,
        }
    }

    /// The `(operand1, operand2)` bytes. Unused operands are zero.
    pub fn operands(&self) -> (u8, u8) {
        match *self {
            Instruction::Nop | Instruction::Hlt => (0, 0),
            Instruction::Ldm { source, target } => (source, target),
            Instruction::Ldq { register, value } => (register, value),
            Instruction::Wrm { location, value } => (location, value),
            Instruction::Add { dest, src } => (dest, src),
            Instruction::Adq { register, value } => (register, value),
        }
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_layout() {
        let word = encode(3, 0xAB, 0xCD);
        assert_eq!(word as u32, 0xABCD_0003);
        assert_eq!(decode(word), (3, 0xAB, 0xCD));
    }

    #[test]
    fn test_high_operand_makes_word_negative() {
        let word = encode(Opcode::Ldq.into(), 0x80, 0);
        assert!(word < 0);
        assert_eq!(decode(word), (3, 0x80, 0));
    }

    #[test]
    fn test_decode_zero_is_nop() {
        assert_eq!(Instruction::decode(0).unwrap(), Instruction::Nop);
    }

    #[test]
    fn test_opcode_ignores_operands() {
        let word = encode(Opcode::Hlt.into(), 0xFF, 0xFF);
        assert_eq!(Instruction::decode(word).unwrap(), Instruction::Hlt);
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(Instruction::decode(7), Err(DecodeError::UnknownOpcode(7)));
        assert_eq!(
            Instruction::decode(encode(0x0100, 1, 2)),
            Err(DecodeError::UnknownOpcode(0x0100))
        );
    }

    #[test]
    fn test_opcode_values() {
        for (value, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(u16::from(*op), value as u16);
            assert_eq!(Opcode::from_u16(value as u16), Some(*op));
        }
        assert_eq!(Opcode::from_u16(7), None);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let test_cases = [
            Instruction::Nop,
            Instruction::Hlt,
            Instruction::Ldm { source: 1, target: 2 },
            Instruction::Ldq { register: 0, value: 255 },
            Instruction::Wrm { location: 15, value: 16 },
            Instruction::Add { dest: 4, src: 4 },
            Instruction::Adq { register: 9, value: 1 },
        ];

        for instr in test_cases {
            assert_eq!(Instruction::decode(instr.encode()).unwrap(), instr);
        }
    }
}
