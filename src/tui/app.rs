//! Debugger application state and logic.

use crate::{Memory, Wcpu};
use crate::asm::disasm::{disassemble_instruction, format_instruction};
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Wcpu,
    /// Initial memory image, for reset.
    pub image: Memory,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<i32>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger over a memory image.
    pub fn new(image: Memory) -> Self {
        Self {
            cpu: Wcpu::new(image.clone()),
            image,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU halted: {:?}", self.cpu.flags());
            self.running = false;
            return;
        }

        let pc = self.cpu.pc();
        match self.cpu.step() {
            Ok(instr) => {
                self.status = format!("PC={:04}: {}", pc, format_instruction(&instr));
            }
            Err(e) => {
                self.status = format!("Error at PC={:04}: {}", pc, e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Halted after {} cycles: {:?}", self.cpu.cycles, self.cpu.flags());
            return;
        }

        let pc = self.cpu.pc();
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset CPU to the initial memory image.
    pub fn reset(&mut self) {
        self.cpu = Wcpu::new(self.image.clone());
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(i32, String, bool)> {
        let pc = self.cpu.pc();
        let half = i32::try_from(lines / 2).unwrap_or(i32::MAX);
        let start = pc.saturating_sub(half).max(0);

        (0..lines)
            .filter_map(|i| {
                let addr = start.checked_add(i32::try_from(i).ok()?)?;
                let word = self.cpu.memory().read(addr).ok()?;
                Some((addr, disassemble_instruction(word), addr == pc))
            })
            .collect()
    }

    /// Largest useful memory scroll offset.
    pub fn max_scroll(&self) -> usize {
        self.cpu.memory().len().saturating_sub(1)
    }
}

/// Run the debugger over a memory image.
pub fn run_debugger(image: Memory) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(image);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll < app.max_scroll() {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
