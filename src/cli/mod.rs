//! cli
//!
//! Command-line interface layer for Fieldwork.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT iterate or mutate tables directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the command handlers, which validate inputs against the declared tool
//! parameter schema and call the [`crate::mutator`] worker functions.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::ui::output::Verbosity;
use anyhow::Result;

/// Execution context threaded through command handlers.
///
/// Workspace state is explicit: the table path is a command argument,
/// never ambient process-wide state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// Verbosity implied by the flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
    };

    // Dispatch to command handler
    commands::dispatch(cli.command, &ctx)
}
