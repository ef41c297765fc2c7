//! TUI debugger for the WCPU.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register bank and flag visualization
//! - Memory view
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
