//! Disassembler for WCPU programs.
//!
//! Converts memory words back to readable assembly.

use crate::cpu::decode::Instruction;

/// Disassemble a single word to text.
pub fn disassemble_instruction(word: i32) -> String {
    match Instruction::decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("??? {:#010x}", word as u32),
    }
}

/// Disassemble a slice of words.
pub fn disassemble(words: &[i32]) -> String {
    let mut output = String::new();
    output.push_str("; WCPU Disassembly\n");
    output.push_str("; ----------------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_instruction(*word);
        output.push_str(&format!("{:04}: {:<16} ; {:08X}\n", addr, line, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    let mnemonic = instr.opcode().mnemonic();
    match *instr {
        Instruction::Nop | Instruction::Hlt => mnemonic.to_string(),
        Instruction::Ldm { source, target } => format!("{} {}, {}", mnemonic, reg(source), reg(target)),
        Instruction::Wrm { location, value } => format!("{} {}, {}", mnemonic, reg(location), reg(value)),
        Instruction::Add { dest, src } => format!("{} {}, {}", mnemonic, reg(dest), reg(src)),
        Instruction::Ldq { register, value } | Instruction::Adq { register, value } => {
            format!("{} {}, {}", mnemonic, reg(register), value)
        }
    }
}

/// Format a register operand; index 16 is the program counter.
fn reg(index: u8) -> String {
    match index {
        16 => "pc".to_string(),
        _ => format!("r{}", index),
    }
}
