//! new command - Create a sample table to experiment on
//!
//! The fixture the other tools are meant to be pointed at: a date
//! `datestamp` field (empty in every row), a text `name`, and an integer
//! `count`, with three rows.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::types::{FieldName, FieldType, Value};
use crate::source::FieldDef;
use crate::store::TableStore;
use crate::ui::output;

/// Create a sample table file.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `table` - Path of the table file to create
/// * `name` - Table display name
pub fn new(ctx: &Context, table: &Path, name: &str) -> Result<()> {
    let datestamp = FieldName::new("datestamp")?;
    let label = FieldName::new("name")?;
    let count = FieldName::new("count")?;

    let store = TableStore::create(
        table,
        name,
        vec![
            FieldDef::new(datestamp, FieldType::Date),
            FieldDef::new(label.clone(), FieldType::Text),
            FieldDef::new(count.clone(), FieldType::Integer),
        ],
    )
    .with_context(|| format!("failed to create table '{}'", table.display()))?;

    for (text, n) in [("alpha", 1), ("beta", 2), ("gamma", 3)] {
        store.insert_row(vec![
            (label.clone(), Value::Text(text.to_string())),
            (count.clone(), Value::Integer(n)),
        ])?;
    }

    output::success(
        format!("Created '{}' with 3 rows at {}", name, table.display()),
        ctx.verbosity(),
    );
    Ok(())
}
