//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Checks its arguments against the tool's declared parameter spec
//! 2. Calls the worker function (the mutator or the store)
//! 3. Formats and displays output
//!
//! Handlers do NOT iterate rows or mutate tables directly.

mod completion;
mod describe;
mod dump;
mod fields;
mod new;
mod stamp;
mod update;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use describe::{builtin_specs, describe};
pub use dump::dump;
pub use fields::fields;
pub use new::new;
pub use stamp::stamp;
pub use update::update;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::New { table, name } => new::new(ctx, &table, &name),
        Command::Fields { table } => fields::fields(ctx, &table),
        Command::Dump { table } => dump::dump(ctx, &table),
        Command::Update {
            table,
            field,
            value,
        } => update::update(ctx, &table, &field, &value),
        Command::Stamp { table, field, date } => {
            stamp::stamp(ctx, &table, &field, date.as_deref())
        }
        Command::Describe { tool, spec } => {
            describe::describe(ctx, tool.as_deref(), spec.as_deref())
        }
        Command::Completion { shell } => completion::completion(shell),
    }
}
