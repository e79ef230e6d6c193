//! update command - Update a field in every row of a table
//!
//! The worker is [`crate::mutator::update_field`]; this shim checks the
//! arguments against the tool's declared parameter spec, parses the value
//! against the field's declared type, and formats the outcome.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context as _, Result};

use crate::cli::Context;
use crate::core::params::{Direction, ParamType, ParameterSpec, Requirement, ToolSpec};
use crate::core::types::FieldName;
use crate::mutator::{update_field, MutatePlan};
use crate::source::RecordSource;
use crate::store::TableStore;
use crate::ui::output;
use crate::ui::progress::ConsoleProgress;

/// Parameter declarations for the update tool.
pub fn spec() -> ToolSpec {
    ToolSpec {
        name: "update".to_string(),
        label: "Field Update tool".to_string(),
        description: "Update a field in every row of a table.".to_string(),
        category: Some("Example".to_string()),
        parameters: vec![
            ParameterSpec {
                name: "table".to_string(),
                display_name: "Table (NOTE, contents will be modified!)".to_string(),
                datatype: ParamType::Table,
                requirement: Requirement::Required,
                direction: Direction::Input,
                default: None,
                constraint: None,
                depends_on: None,
            },
            ParameterSpec {
                name: "field".to_string(),
                display_name: "Name of the field that will be updated".to_string(),
                datatype: ParamType::Field,
                requirement: Requirement::Required,
                direction: Direction::Input,
                default: None,
                constraint: None,
                depends_on: Some("table".to_string()),
            },
            ParameterSpec {
                name: "value".to_string(),
                display_name: "Value to write into the field".to_string(),
                datatype: ParamType::String,
                requirement: Requirement::Required,
                direction: Direction::Input,
                default: None,
                constraint: None,
                depends_on: None,
            },
            ParameterSpec {
                name: "out_table".to_string(),
                display_name: "The updated table (same file, modified in place)".to_string(),
                datatype: ParamType::Table,
                requirement: Requirement::Derived,
                direction: Direction::Output,
                default: None,
                constraint: None,
                depends_on: Some("table".to_string()),
            },
        ],
    }
}

/// Update a field in every row of a table.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `table` - Path of the table file
/// * `field` - Field to update
/// * `value` - Value to write, parsed against the field's declared type
pub fn update(ctx: &Context, table: &Path, field: &str, value: &str) -> Result<()> {
    let spec = spec();
    let supplied: BTreeMap<String, String> = [
        ("table", table.display().to_string()),
        ("field", field.to_string()),
        ("value", value.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    spec.check_values(&supplied)?;

    let store = TableStore::open(table)
        .with_context(|| format!("failed to open table '{}'", table.display()))?;
    let field = FieldName::new(field)?;

    // The field's declared type governs how the value string parses.
    let defs = RecordSource::fields(&store)?;
    let def = defs
        .iter()
        .find(|f| f.name == field)
        .ok_or_else(|| anyhow!("field '{}' not found on '{}'", field, store.name()))?;
    let parsed = def.ty.parse_value(value)?;

    output::debug(
        format!("updating '{}' on '{}'", field, store.name()),
        ctx.verbosity(),
    );

    let mut progress = ConsoleProgress::new(ctx.verbosity());
    let outcome = update_field(&store, &field, &MutatePlan::constant(parsed), &mut progress)?;

    match &outcome.first_error {
        Some(failure) => bail!(
            "updated {} of {} rows; {}",
            outcome.rows_succeeded,
            outcome.rows_attempted,
            failure
        ),
        None => {
            output::success(
                format!(
                    "Updated {} of {} rows",
                    outcome.rows_succeeded, outcome.rows_attempted
                ),
                ctx.verbosity(),
            );
            Ok(())
        }
    }
}
