//! CPU execution engine for the WCPU.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{DecodeError, Instruction};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::RegisterError;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Halt and error bits recorded by the engine.
///
/// Bits are only ever set during a run, never cleared.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorFlags(u32);

impl ErrorFlags {
    /// An unrecognized opcode was fetched.
    pub const UNKNOWN_OPCODE: ErrorFlags = ErrorFlags(1 << 0);
    /// A memory or register operand was out of range.
    pub const ADDRESS_FAULT: ErrorFlags = ErrorFlags(1 << 1);
    /// The run loop must stop.
    pub const HALT: ErrorFlags = ErrorFlags(1 << 31);

    /// No flags set.
    pub const fn empty() -> Self {
        ErrorFlags(0)
    }

    /// True if every bit of `other` is set.
    pub const fn contains(self, other: ErrorFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: ErrorFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ErrorFlags {
    type Output = ErrorFlags;

    fn bitor(self, rhs: ErrorFlags) -> ErrorFlags {
        ErrorFlags(self.0 | rhs.0)
    }
}

impl std::fmt::Debug for ErrorFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::UNKNOWN_OPCODE) {
            names.push("UNKNOWN_OPCODE");
        }
        if self.contains(Self::ADDRESS_FAULT) {
            names.push("ADDRESS_FAULT");
        }
        if self.contains(Self::HALT) {
            names.push("HALT");
        }
        if names.is_empty() {
            write!(f, "ErrorFlags(empty)")
        } else {
            write!(f, "ErrorFlags({})", names.join(" | "))
        }
    }
}

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted. Terminal.
    Halted,
}

/// The WCPU execution engine.
///
/// Owns its memory and register file for the lifetime of a run.
#[derive(Clone, Serialize, Deserialize)]
pub struct Wcpu {
    /// CPU registers.
    regs: Registers,
    /// Main memory.
    mem: Memory,
    /// Halt and error bits.
    flags: ErrorFlags,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Wcpu {
    /// Create a new CPU bound to `memory`, with zeroed registers.
    pub fn new(memory: Memory) -> Self {
        Self {
            regs: Registers::new(),
            mem: memory,
            flags: ErrorFlags::empty(),
            cycles: 0,
            last_instr: None,
        }
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed. Any error also sets the
    /// halt flag, so the CPU stops after the faulting instruction.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.is_halted() {
            return Err(CpuError::NotRunning(self.flags));
        }

        match self.fetch_and_execute() {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(e) => {
                self.cycles += 1;
                self.flags.insert(e.flags());
                Err(e)
            }
        }
    }

    fn fetch_and_execute(&mut self) -> Result<Instruction, CpuError> {
        // Fetch
        let word = self.mem.read(self.regs.pc)?;
        self.regs.advance_pc();

        // Decode
        let instr = Instruction::decode(word)?;

        // Execute
        self.execute(instr)?;

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while !self.is_halted() {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while !self.is_halted() && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        match instr {
            Instruction::Nop => {}

            Instruction::Hlt => {
                self.flags.insert(ErrorFlags::HALT);
            }

            Instruction::Ldm { source, target } => {
                let addr = self.regs.get(source)?;
                let value = self.mem.read(addr)?;
                self.regs.set(target, value)?;
            }

            Instruction::Ldq { register, value } => {
                self.regs.set(register, value as i32)?;
            }

            Instruction::Wrm { location, value } => {
                let addr = self.regs.get(location)?;
                let value = self.regs.get(value)?;
                self.mem.write(addr, value)?;
            }

            Instruction::Add { dest, src } => {
                let sum = self.regs.get(dest)?.wrapping_add(self.regs.get(src)?);
                self.regs.set(dest, sum)?;
            }

            Instruction::Adq { register, value } => {
                self.regs.add_immediate(register, value)?;
            }
        }

        Ok(())
    }

    /// The register file.
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Mutable access to the register file, for setting up a run.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// The memory.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Give back the memory, consuming the CPU.
    pub fn into_memory(self) -> Memory {
        self.mem
    }

    /// Current program counter.
    pub fn pc(&self) -> i32 {
        self.regs.pc
    }

    /// Halt and error bits.
    pub fn flags(&self) -> ErrorFlags {
        self.flags
    }

    /// Current execution state.
    pub fn state(&self) -> CpuState {
        if self.is_halted() {
            CpuState::Halted
        } else {
            CpuState::Running
        }
    }

    /// Get the last successfully executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.flags.contains(ErrorFlags::HALT)
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        !self.is_halted()
    }
}

impl std::fmt::Debug for Wcpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wcpu")
            .field("flags", &self.flags)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(ErrorFlags),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl CpuError {
    /// Flags recorded when this error stops a run.
    pub fn flags(&self) -> ErrorFlags {
        match self {
            CpuError::NotRunning(_) => ErrorFlags::empty(),
            CpuError::Memory(_) | CpuError::Register(_) => ErrorFlags::ADDRESS_FAULT | ErrorFlags::HALT,
            CpuError::Decode(_) => ErrorFlags::UNKNOWN_OPCODE | ErrorFlags::HALT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::program::sample_program;
    use crate::cpu::registers::PROGRAM_COUNTER;

    fn make_cpu(instructions: &[Instruction]) -> Wcpu {
        let program: Vec<i32> = instructions.iter().map(Instruction::encode).collect();
        Wcpu::new(Memory::with_program(&program, 32).unwrap())
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = make_cpu(&[Instruction::Hlt]);

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 1);
        assert!(cpu.is_halted());
        assert_eq!(cpu.state(), CpuState::Halted);
        assert_eq!(cpu.pc(), 1);
        assert!(!cpu.flags().contains(ErrorFlags::UNKNOWN_OPCODE));
    }

    #[test]
    fn test_cpu_nop_then_halt() {
        let mut cpu = make_cpu(&[
            Instruction::Nop,
            Instruction::Nop,
            Instruction::Nop,
            Instruction::Hlt,
        ]);

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 4);
        assert_eq!(cpu.pc(), 4);
    }

    #[test]
    fn test_unknown_opcode_halts() {
        let mut cpu = Wcpu::new(Memory::from_words(&[0x0000_0042, 0]));

        let result = cpu.run();

        assert_eq!(result, Err(CpuError::Decode(DecodeError::UnknownOpcode(0x42))));
        assert_eq!(cpu.cycles, 1);
        assert_eq!(cpu.pc(), 1);
        assert!(cpu.flags().contains(ErrorFlags::UNKNOWN_OPCODE | ErrorFlags::HALT));
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_step_after_halt() {
        let mut cpu = make_cpu(&[Instruction::Hlt]);
        cpu.run().unwrap();

        assert!(matches!(cpu.step(), Err(CpuError::NotRunning(_))));
        assert_eq!(cpu.pc(), 1);
    }

    #[test]
    fn test_ldq_adq() {
        let mut cpu = make_cpu(&[
            Instruction::Ldq { register: 2, value: 200 },
            Instruction::Adq { register: 2, value: 100 },
            Instruction::Hlt,
        ]);

        cpu.run().unwrap();

        assert_eq!(cpu.registers().general[2], 300);
    }

    #[test]
    fn test_add_same_register_doubles() {
        let mut cpu = make_cpu(&[
            Instruction::Ldq { register: 3, value: 21 },
            Instruction::Add { dest: 3, src: 3 },
            Instruction::Hlt,
        ]);

        cpu.run().unwrap();

        assert_eq!(cpu.registers().general[3], 42);
    }

    #[test]
    fn test_add_wraps() {
        let mut cpu = make_cpu(&[
            Instruction::Add { dest: 0, src: 1 },
            Instruction::Hlt,
        ]);
        cpu.registers_mut().general[0] = i32::MAX;
        cpu.registers_mut().general[1] = 2;

        cpu.run().unwrap();

        assert_eq!(cpu.registers().general[0], i32::MIN + 1);
        assert_eq!(cpu.flags(), ErrorFlags::HALT);
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut cpu = make_cpu(&[
            Instruction::Ldq { register: 1, value: 20 },
            Instruction::Ldq { register: 2, value: 77 },
            Instruction::Wrm { location: 1, value: 2 },
            Instruction::Ldm { source: 1, target: 3 },
            Instruction::Hlt,
        ]);

        cpu.run().unwrap();

        assert_eq!(cpu.memory().read(20).unwrap(), 77);
        assert_eq!(cpu.registers().general[3], 77);
    }

    #[test]
    fn test_memory_fault_halts() {
        let mut cpu = make_cpu(&[
            Instruction::Ldq { register: 0, value: 200 },
            Instruction::Wrm { location: 0, value: 0 },
            Instruction::Hlt,
        ]);
        let before = cpu.memory().clone();

        let result = cpu.run();

        assert!(matches!(result, Err(CpuError::Memory(MemoryError::AddressOutOfRange { addr: 200, .. }))));
        assert!(cpu.flags().contains(ErrorFlags::ADDRESS_FAULT | ErrorFlags::HALT));
        assert!(!cpu.flags().contains(ErrorFlags::UNKNOWN_OPCODE));
        assert_eq!(cpu.memory(), &before);
        assert_eq!(cpu.pc(), 2);
    }

    #[test]
    fn test_register_fault_halts() {
        let mut cpu = make_cpu(&[
            Instruction::Ldq { register: 17, value: 1 },
            Instruction::Hlt,
        ]);

        let result = cpu.run();

        assert_eq!(result, Err(CpuError::Register(RegisterError::InvalidIndex(17))));
        assert!(cpu.flags().contains(ErrorFlags::ADDRESS_FAULT));
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_fetch_past_end_faults() {
        // No HLT: execution runs off the end of memory.
        let mut cpu = Wcpu::new(Memory::new(3));

        let result = cpu.run();

        assert!(matches!(result, Err(CpuError::Memory(_))));
        assert_eq!(cpu.cycles, 4);
        assert!(cpu.flags().contains(ErrorFlags::ADDRESS_FAULT));
    }

    #[test]
    fn test_program_counter_register_is_a_jump() {
        let mut cpu = make_cpu(&[
            Instruction::Ldq { register: PROGRAM_COUNTER, value: 3 },
            Instruction::Ldq { register: 0, value: 9 }, // skipped
            Instruction::Hlt,                           // skipped
            Instruction::Hlt,
        ]);

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 2);
        assert_eq!(cpu.registers().general[0], 0);
        assert_eq!(cpu.pc(), 4);
    }

    #[test]
    fn test_run_limited() {
        let mut cpu = make_cpu(&[Instruction::Nop; 8]);

        assert_eq!(cpu.run_limited(5).unwrap(), 5);
        assert!(cpu.is_running());
        assert_eq!(cpu.pc(), 5);
        assert_eq!(cpu.last_instruction(), Some(Instruction::Nop));
    }

    #[test]
    fn test_run_limited_unbounded_after_step() {
        let mut cpu = make_cpu(&[
            Instruction::Nop,
            Instruction::Nop,
            Instruction::Nop,
            Instruction::Hlt,
        ]);
        cpu.step().unwrap();

        assert_eq!(cpu.run_limited(u64::MAX).unwrap(), 3);
        assert!(cpu.is_halted());
        assert_eq!(cpu.cycles, 4);
    }

    #[test]
    fn test_sample_program() {
        let mut cpu = Wcpu::new(Memory::with_program(&sample_program(), 16).unwrap());

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 5);
        assert_eq!(cpu.memory().read(10).unwrap(), 5);
        assert_eq!(cpu.pc(), 5);
        assert_eq!(cpu.flags(), ErrorFlags::HALT);
        assert_eq!(cpu.registers().general[0], 10);
        assert_eq!(cpu.registers().general[1], 5);
    }

    #[test]
    fn test_flags_debug() {
        assert_eq!(format!("{:?}", ErrorFlags::empty()), "ErrorFlags(empty)");
        assert_eq!(
            format!("{:?}", ErrorFlags::UNKNOWN_OPCODE | ErrorFlags::HALT),
            "ErrorFlags(UNKNOWN_OPCODE | HALT)"
        );
    }
}
