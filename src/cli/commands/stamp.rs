//! stamp command - Write a datestamp into every row of a table
//!
//! Convenience form of `update` for date fields: the field defaults to
//! `datestamp` and the date defaults to today.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use chrono::Local;

use crate::cli::Context;
use crate::core::params::{Direction, ParamType, ParameterSpec, Requirement, ToolSpec};
use crate::core::types::{FieldName, FieldType, Value};
use crate::mutator::{update_field, MutatePlan};
use crate::source::RecordSource;
use crate::store::TableStore;
use crate::ui::output;
use crate::ui::progress::ConsoleProgress;

/// Parameter declarations for the stamp tool.
pub fn spec() -> ToolSpec {
    ToolSpec {
        name: "stamp".to_string(),
        label: "Datestamp tool".to_string(),
        description: "Write a datestamp into every row of a table.".to_string(),
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
                display_name: "Name of the field that will have the date written into it"
                    .to_string(),
                datatype: ParamType::Field,
                requirement: Requirement::Required,
                direction: Direction::Input,
                default: Some("datestamp".to_string()),
                constraint: None,
                depends_on: Some("table".to_string()),
            },
            ParameterSpec {
                name: "date".to_string(),
                display_name: "Date to write; today when omitted".to_string(),
                datatype: ParamType::Date,
                requirement: Requirement::Optional,
                direction: Direction::Input,
                default: None,
                constraint: None,
                depends_on: None,
            },
        ],
    }
}

/// Write a datestamp into every row of a table.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `table` - Path of the table file
/// * `field` - Field to stamp (the tool's default is `datestamp`)
/// * `date` - Date to write; today when `None`
pub fn stamp(ctx: &Context, table: &Path, field: &str, date: Option<&str>) -> Result<()> {
    let spec = spec();
    let mut supplied: BTreeMap<String, String> = BTreeMap::new();
    supplied.insert("table".to_string(), table.display().to_string());
    supplied.insert("field".to_string(), field.to_string());
    if let Some(date) = date {
        supplied.insert("date".to_string(), date.to_string());
    }
    spec.check_values(&supplied)?;

    let value = match date {
        Some(date) => FieldType::Date.parse_value(date)?,
        None => Value::Date(Local::now().date_naive()),
    };

    let store = TableStore::open(table)
        .with_context(|| format!("failed to open table '{}'", table.display()))?;
    let field = FieldName::new(field)?;

    output::debug(
        format!("stamping '{}' on '{}' with {}", field, store.name(), value),
        ctx.verbosity(),
    );

    let mut progress = ConsoleProgress::new(ctx.verbosity());
    let outcome = update_field(&store, &field, &MutatePlan::constant(value), &mut progress)?;

    match &outcome.first_error {
        Some(failure) => bail!(
            "stamped {} of {} rows; {}",
            outcome.rows_succeeded,
            outcome.rows_attempted,
            failure
        ),
        None => {
            output::success(
                format!(
                    "Stamped {} of {} rows",
                    outcome.rows_succeeded, outcome.rows_attempted
                ),
                ctx.verbosity(),
            );
            Ok(())
        }
    }
}
