//! WCPU - CLI Entry Point
//!
//! Commands:
//! - `wcpu` - Dump, run and dump the built-in sample program
//! - `wcpu run` - Run the sample program with tracing and limits
//! - `wcpu disasm` - Disassemble the sample program
//! - `wcpu debug` - Interactive debugger

use clap::{Parser, Subcommand};
use wcpu::{Memory, Wcpu};
use wcpu::asm::{sample_program, SAMPLE_MEMORY_SIZE};

#[derive(Parser)]
#[command(name = "wcpu")]
#[command(version = "0.1.0")]
#[command(about = "A minimal word-addressed virtual CPU")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sample program until it halts
    Run {
        /// Memory size in words
        #[arg(short = 's', long, default_value_t = SAMPLE_MEMORY_SIZE)]
        memory_size: usize,
        /// Maximum number of instructions to execute
        #[arg(short, long, default_value = "10000")]
        max_steps: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Disassemble the sample program
    Disasm,
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Memory size in words
        #[arg(short = 's', long, default_value_t = SAMPLE_MEMORY_SIZE)]
        memory_size: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { memory_size, max_steps, trace, json }) => {
            run_program(memory_size, max_steps, trace, json);
        }
        Some(Commands::Disasm) => {
            println!("{}", wcpu::disassemble(&sample_program()));
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { memory_size }) => {
            debug_program(memory_size);
        }
        None => {
            run_sample();
        }
    }
}

fn load_memory(memory_size: usize) -> Memory {
    match Memory::with_program(&sample_program(), memory_size) {
        Ok(mem) => mem,
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

/// Dump memory, run to completion, dump memory again.
fn run_sample() {
    let mem = load_memory(SAMPLE_MEMORY_SIZE);
    print!("{}", mem);

    let mut cpu = Wcpu::new(mem);
    if let Err(e) = cpu.run() {
        eprintln!("❌ CPU error: {} ({:?})", e, cpu.flags());
    }

    println!();
    print!("{}", cpu.memory());
}

fn run_program(memory_size: usize, max_steps: u64, trace: bool, json: bool) {
    use wcpu::asm::disasm::format_instruction;

    let mut cpu = Wcpu::new(load_memory(memory_size));

    if !json {
        println!("━━━ Execution ━━━");
    }

    let mut failed = false;
    if trace {
        let mut steps = 0u64;
        while cpu.is_running() && steps < max_steps {
            let pc = cpu.pc();

            match cpu.step() {
                Ok(instr) => {
                    println!("{:04}: {:<16} {:?}", pc, format_instruction(&instr), cpu.registers().general);
                    steps += 1;
                }
                Err(e) => {
                    eprintln!("❌ CPU error at PC={}: {}", pc, e);
                    failed = true;
                    break;
                }
            }
        }
    } else if let Err(e) = cpu.run_limited(max_steps) {
        eprintln!("❌ CPU error: {} ({:?})", e, cpu.flags());
        failed = true;
    }

    if json {
        match serde_json::to_string_pretty(&cpu) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!();
        println!("━━━ Result ━━━");
        println!("Cycles: {}", cpu.cycles);
        println!("State:  {:?}", cpu.state());
        println!("Flags:  {:?}", cpu.flags());
        println!("PC:     {}", cpu.pc());
        for (index, value) in cpu.registers().general.iter().enumerate() {
            if *value != 0 {
                println!("r{:<2}     {}", index, value);
            }
        }
        println!();
        print!("{}", cpu.memory());

        if cpu.is_running() {
            println!();
            println!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", max_steps);
        }
    }

    if failed {
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_program(memory_size: usize) {
    println!("🚀 Launching debugger...");

    if let Err(e) = wcpu::run_debugger(load_memory(memory_size)) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}
