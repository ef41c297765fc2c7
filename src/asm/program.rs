//! Program construction for the WCPU.
//!
//! There is no textual assembly language: programs are built in code,
//! one encoded word per instruction or data value.

use crate::cpu::decode::{encode, Instruction, Opcode};

/// Pack an opcode and its operand bytes into an instruction word.
pub fn opcode_with_values(opcode: Opcode, value1: u8, value2: u8) -> i32 {
    encode(opcode.into(), value1, value2)
}

/// Incremental builder for a program image.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    words: Vec<i32>,
}

impl ProgramBuilder {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn instr(mut self, instr: Instruction) -> Self {
        self.words.push(instr.encode());
        self
    }

    /// Append a raw data word.
    pub fn data(mut self, word: i32) -> Self {
        self.words.push(word);
        self
    }

    pub fn nop(self) -> Self {
        self.instr(Instruction::Nop)
    }

    pub fn hlt(self) -> Self {
        self.instr(Instruction::Hlt)
    }

    pub fn ldm(self, source: u8, target: u8) -> Self {
        self.instr(Instruction::Ldm { source, target })
    }

    pub fn ldq(self, register: u8, value: u8) -> Self {
        self.instr(Instruction::Ldq { register, value })
    }

    pub fn wrm(self, location: u8, value: u8) -> Self {
        self.instr(Instruction::Wrm { location, value })
    }

    pub fn add(self, dest: u8, src: u8) -> Self {
        self.instr(Instruction::Add { dest, src })
    }

    pub fn adq(self, register: u8, value: u8) -> Self {
        self.instr(Instruction::Adq { register, value })
    }

    /// Address the next appended word will occupy.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Finish and return the words.
    pub fn build(self) -> Vec<i32> {
        self.words
    }
}

/// The built-in demo: computes 6 + 4 into r0, then stores 5 at that address.
///
/// ```text
/// 0: LDQ r0, 6
/// 1: ADQ r0, 4
/// 2: LDQ r1, 5
/// 3: WRM r0, r1    ; M[10] := 5
/// 4: HLT
/// 5: 0
/// ```
pub fn sample_program() -> Vec<i32> {
    ProgramBuilder::new()
        .ldq(0, 6)
        .adq(0, 4)
        .ldq(1, 5)
        .wrm(0, 1)
        .hlt()
        .data(0)
        .build()
}

/// Memory size used when running the sample program.
pub const SAMPLE_MEMORY_SIZE: usize = 16;
