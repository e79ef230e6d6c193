//! fields command - List a table's field schema

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::store::TableStore;
use crate::ui::output;

/// List a table's fields, one `name (type)` line per field.
pub fn fields(ctx: &Context, table: &Path) -> Result<()> {
    let store = TableStore::open(table)
        .with_context(|| format!("failed to open table '{}'", table.display()))?;
    let snapshot = store.snapshot()?;

    output::print(
        format!("{} ({} fields)", snapshot.name, snapshot.fields.len()),
        ctx.verbosity(),
    );
    for field in &snapshot.fields {
        output::print(format!("  {} ({})", field.name, field.ty), ctx.verbosity());
    }
    Ok(())
}
