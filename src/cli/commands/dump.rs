//! dump command - Print every row of a table
//!
//! Rows print in table order with their row id, fields in declaration
//! order, tab-separated.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::types::Value;
use crate::store::TableStore;
use crate::ui::output;

/// Print every row of a table.
pub fn dump(ctx: &Context, table: &Path) -> Result<()> {
    let store = TableStore::open(table)
        .with_context(|| format!("failed to open table '{}'", table.display()))?;
    let snapshot = store.snapshot()?;

    let header: Vec<&str> = std::iter::once("id")
        .chain(snapshot.fields.iter().map(|f| f.name.as_str()))
        .collect();
    output::print(header.join("\t"), ctx.verbosity());

    for row in &snapshot.rows {
        let mut line = vec![row.id.to_string()];
        for field in &snapshot.fields {
            let value = row.values.get(&field.name).unwrap_or(&Value::Null);
            line.push(value.to_string());
        }
        output::print(line.join("\t"), ctx.verbosity());
    }
    Ok(())
}
