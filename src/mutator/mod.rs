//! mutator
//!
//! The Batch Field Mutator: one bounded read-write pass over an external
//! record source, rewriting one field in every row.
//!
//! # Lifecycle
//!
//! Every pass follows a uniform lifecycle enforced here:
//!
//! ```text
//! Idle -> CountingRows -> Iterating -> (Committed | Aborted) -> Released
//! ```
//!
//! - **CountingRows**: capture the row count `N` once; validate the field
//!   exists and (for constant values) that the value matches its type
//! - **Iterating**: one row at a time - compute, write, commit, report -
//!   looping back once per row
//! - **Committed**: all `N` rows processed without error
//! - **Aborted**: first row-level failure; rows before it stay committed
//! - **Released**: the scoped cursor is dropped, on every exit path
//!
//! # Invariants
//!
//! - Validation failures are detected eagerly, before any mutation
//! - Each committed row write is durable before the next row begins
//! - A row-level failure aborts the remainder; prior commits are never
//!   rolled back
//! - Reporting failures never alter the pass
//!
//! # Example
//!
//! ```
//! use fieldwork::core::types::{FieldName, FieldType};
//! use fieldwork::mutator::{update_field, MutatePlan, NullProgress};
//! use fieldwork::source::MemoryTable;
//!
//! let table = MemoryTable::sample();
//! let field = FieldName::new("datestamp").unwrap();
//! let value = FieldType::Date.parse_value("2021-07-08").unwrap();
//!
//! let outcome = update_field(
//!     &table,
//!     &field,
//!     &MutatePlan::constant(value),
//!     &mut NullProgress,
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.rows_attempted, 3);
//! assert_eq!(outcome.rows_succeeded, 3);
//! assert!(outcome.first_error.is_none());
//! ```

use thiserror::Error;

use crate::core::types::{FieldName, FieldType, RowId, Value};
use crate::source::{RecordSource, SourceError};

pub mod progress;

pub use progress::{CollectingProgress, NullProgress, ProgressEvent, ProgressSink, ReportingError};

/// Errors from a mutation pass, surfaced before any row is written.
///
/// Row-level failures are not errors of the call: they are recorded in
/// [`MutationOutcome::first_error`], preserving the partial-success count.
#[derive(Debug, Error)]
pub enum MutateError {
    /// The record source does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// The named field does not exist on the source.
    #[error("field '{field}' not found on source '{source_name}'")]
    FieldNotFound {
        /// The field that was requested
        field: FieldName,
        /// The source that was searched
        source_name: String,
    },

    /// The constant value is incompatible with the field's declared type.
    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// The target field
        field: FieldName,
        /// The field's declared type
        expected: FieldType,
        /// The type of the rejected value
        actual: FieldType,
    },

    /// Acquiring the count or the scoped cursor failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// The first row-level failure of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// The offending row, when its identity is known. A failure reading
    /// the next row has no identity yet.
    pub row_id: Option<RowId>,
    /// Description of the failure.
    pub message: String,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row_id {
            Some(id) => write!(f, "row {}: {}", id, self.message),
            None => write!(f, "next row: {}", self.message),
        }
    }
}

impl std::error::Error for RowFailure {}

/// Result of one mutation pass. Immutable after return.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// The row population the pass committed to, captured once in
    /// `CountingRows` and not re-validated mid-pass.
    pub rows_attempted: u64,
    /// Rows whose new value was committed.
    pub rows_succeeded: u64,
    /// The failure that aborted the pass, if any.
    pub first_error: Option<RowFailure>,
    /// Best-effort notifications that could not be delivered.
    pub reporting_failures: u64,
}

impl MutationOutcome {
    /// True if every attempted row was committed.
    pub fn is_complete(&self) -> bool {
        self.first_error.is_none() && self.rows_succeeded == self.rows_attempted
    }
}

/// Where the value written into each row comes from.
pub enum ValueSource<'a> {
    /// The same value for every row. Type-checked eagerly, before the
    /// pass begins.
    Constant(Value),
    /// A per-row function of the row id. Produced values are checked at
    /// their row; a mismatch there is that row's failure.
    PerRow(Box<dyn Fn(RowId) -> Value + 'a>),
}

impl std::fmt::Debug for ValueSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ValueSource::PerRow(_) => f.write_str("PerRow(..)"),
        }
    }
}

/// Validation hook: flag a value before write. A returned message is
/// emitted as a warning; the value is still written.
pub type ValidationHook<'a> = Box<dyn Fn(RowId, &Value) -> Option<String> + 'a>;

/// What a pass writes and how it is vetted.
pub struct MutatePlan<'a> {
    /// The value (or value producer) to write.
    pub value: ValueSource<'a>,
    /// Optional pre-write validation hook.
    pub validator: Option<ValidationHook<'a>>,
}

impl<'a> MutatePlan<'a> {
    /// Plan writing the same value into every row.
    pub fn constant(value: Value) -> Self {
        Self {
            value: ValueSource::Constant(value),
            validator: None,
        }
    }

    /// Plan writing a per-row computed value.
    pub fn per_row(f: impl Fn(RowId) -> Value + 'a) -> Self {
        Self {
            value: ValueSource::PerRow(Box::new(f)),
            validator: None,
        }
    }

    /// Attach a validation hook.
    pub fn with_validator(mut self, hook: impl Fn(RowId, &Value) -> Option<String> + 'a) -> Self {
        self.validator = Some(Box::new(hook));
        self
    }
}

/// States of one mutation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Entry state; nothing acquired.
    Idle,
    /// Capturing the row count and validating preconditions.
    CountingRows,
    /// One row at a time; loops back once per row.
    Iterating,
    /// All attempted rows committed.
    Committed,
    /// First row-level failure stopped the pass.
    Aborted,
    /// Terminal: the scoped cursor has been released.
    Released,
}

impl PassState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: PassState) -> bool {
        use PassState::*;
        matches!(
            (self, next),
            (Idle, CountingRows)
                | (CountingRows, Iterating)
                | (Iterating, Iterating)
                | (Iterating, Committed)
                | (Iterating, Aborted)
                | (Committed, Released)
                | (Aborted, Released)
        )
    }
}

/// Pass state holder; transitions are checked in debug builds.
#[derive(Debug)]
struct Pass {
    state: PassState,
}

impl Pass {
    fn new() -> Self {
        Self {
            state: PassState::Idle,
        }
    }

    fn advance(&mut self, next: PassState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal pass transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}

/// Rewrite `field` in every row of `source`.
///
/// Captures the row count once, opens a scoped cursor restricted to the
/// identifier column and `field`, and commits one row at a time. Each
/// committed row is durable before the next row begins; the first
/// row-level failure aborts the remainder, preserving prior commits. The
/// cursor is released on every exit path.
///
/// One progress notification is emitted per committed row (1-based step
/// of the captured total). Reporting failures never alter the pass; they
/// are counted in the outcome.
///
/// # Errors
///
/// Pre-iteration failures only (zero rows written in every case):
///
/// - [`MutateError::SourceNotFound`] if the source is absent
/// - [`MutateError::FieldNotFound`] if the field is absent
/// - [`MutateError::TypeMismatch`] if a constant value does not match the
///   field's declared type
/// - [`MutateError::Source`] if the count or the cursor cannot be acquired
pub fn update_field(
    source: &dyn RecordSource,
    field: &FieldName,
    plan: &MutatePlan,
    progress: &mut dyn ProgressSink,
) -> Result<MutationOutcome, MutateError> {
    let mut pass = Pass::new();
    pass.advance(PassState::CountingRows);

    let fields = source.fields().map_err(not_found_or_source)?;
    let field_def = fields
        .iter()
        .find(|f| &f.name == field)
        .ok_or_else(|| MutateError::FieldNotFound {
            field: field.clone(),
            source_name: source.name().to_string(),
        })?;

    if let ValueSource::Constant(value) = &plan.value {
        // Null is writable into any field type; only typed values can clash.
        if let Some(actual) = value.field_type() {
            if actual != field_def.ty {
                return Err(MutateError::TypeMismatch {
                    field: field.clone(),
                    expected: field_def.ty,
                    actual,
                });
            }
        }
    }

    let total = source.count_records().map_err(not_found_or_source)?;
    let mut cursor = source.open_cursor(field).map_err(not_found_or_source)?;
    pass.advance(PassState::Iterating);

    let mut outcome = MutationOutcome {
        rows_attempted: total,
        rows_succeeded: 0,
        first_error: None,
        reporting_failures: 0,
    };
    let mut step: u64 = 0;

    while step < total {
        let row = match cursor.read_next() {
            Ok(row) => row,
            Err(e) => {
                outcome.first_error = Some(RowFailure {
                    row_id: None,
                    message: e.to_string(),
                });
                break;
            }
        };
        // End of sequence before the captured count: the source shrank
        // under the pass. Not an error; succeeded stays below attempted.
        let Some((row_id, _current)) = row else {
            break;
        };
        step += 1;
        pass.advance(PassState::Iterating);

        let value = match &plan.value {
            ValueSource::Constant(v) => v.clone(),
            ValueSource::PerRow(f) => f(row_id),
        };

        if let Some(actual) = value.field_type() {
            if actual != field_def.ty {
                outcome.first_error = Some(RowFailure {
                    row_id: Some(row_id),
                    message: format!(
                        "type mismatch: expected {}, got {}",
                        field_def.ty, actual
                    ),
                });
                break;
            }
        }

        if let Some(validator) = &plan.validator {
            if let Some(warning) = validator(row_id, &value) {
                if progress.report_warning(&warning).is_err() {
                    outcome.reporting_failures += 1;
                }
            }
        }

        if let Err(e) = cursor.write_current(value) {
            outcome.first_error = Some(RowFailure {
                row_id: Some(row_id),
                message: e.to_string(),
            });
            break;
        }
        outcome.rows_succeeded += 1;

        let label = format!("Updating {}: step {} of {}", field, step, total);
        if progress.report_progress(step, total, &label).is_err() {
            outcome.reporting_failures += 1;
        }
    }

    if let Some(failure) = &outcome.first_error {
        pass.advance(PassState::Aborted);
        if progress.report_error(&failure.to_string()).is_err() {
            outcome.reporting_failures += 1;
        }
    } else {
        pass.advance(PassState::Committed);
    }

    drop(cursor);
    pass.advance(PassState::Released);

    Ok(outcome)
}

/// Map a source-acquisition failure into the pass error taxonomy.
fn not_found_or_source(e: SourceError) -> MutateError {
    match e {
        SourceError::NotFound(name) => MutateError::SourceNotFound(name),
        other => MutateError::Source(other),
    }
}
