//! source::memory
//!
//! In-memory record source for deterministic testing and demos.
//!
//! # Design
//!
//! `MemoryTable` stores rows in memory behind the [`RecordSource`] trait
//! and allows configuring failure scenarios: a specific operation, or a
//! specific 1-indexed read/write step, can be made to fail with a chosen
//! error. Every operation is recorded for test verification, and the
//! number of currently open cursors is tracked so tests can assert the
//! scoped handle is released on every exit path.
//!
//! # Example
//!
//! ```
//! use fieldwork::core::types::{FieldName, FieldType};
//! use fieldwork::source::{FieldDef, MemoryTable, RecordSource};
//!
//! let field = FieldName::new("datestamp").unwrap();
//! let table = MemoryTable::new(
//!     "testing_data",
//!     vec![FieldDef::new(field.clone(), FieldType::Date)],
//! );
//! let row = table.insert_row(vec![]);
//!
//! assert_eq!(table.count_records().unwrap(), 1);
//!
//! let mut cursor = table.open_cursor(&field).unwrap();
//! let (id, value) = cursor.read_next().unwrap().unwrap();
//! assert_eq!(id, row);
//! assert!(value.is_null());
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{CursorError, FieldDef, RecordSource, SourceError, UpdateCursor};
use crate::core::types::{FieldName, FieldType, RowId, Value};

/// In-memory record source for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    /// Source display name.
    name: String,
    /// Internal state shared across clones and open cursors.
    inner: Arc<Mutex<MemoryInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MemoryInner {
    /// Field schema.
    fields: Vec<FieldDef>,
    /// Stored rows, in insertion order.
    rows: Vec<MemoryRow>,
    /// Next row id to assign.
    next_row_id: i64,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<SourceOperation>,
    /// Number of cursors currently open.
    open_cursors: usize,
}

/// One stored row.
#[derive(Debug, Clone)]
struct MemoryRow {
    id: RowId,
    values: BTreeMap<FieldName, Value>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `fields` with the given error.
    Fields(SourceError),
    /// Fail `count_records` with the given error.
    CountRecords(SourceError),
    /// Fail `open_cursor` with the given error.
    OpenCursor(SourceError),
    /// Fail the `step`-th (1-indexed) `read_next` with the given error.
    ReadStep { step: u64, error: CursorError },
    /// Fail the `step`-th (1-indexed) `write_current` with the given error.
    WriteStep { step: u64, error: CursorError },
}

/// Recorded operation for test verification.
#[derive(Debug, Clone)]
pub enum SourceOperation {
    Fields,
    CountRecords,
    OpenCursor { field: FieldName },
    ReadNext { step: u64 },
    WriteCurrent { row_id: RowId, value: Value },
}

impl MemoryTable {
    /// Create a new empty table with the given field schema.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(MemoryInner {
                fields,
                rows: Vec::new(),
                next_row_id: 1,
                fail_on: None,
                operations: Vec::new(),
                open_cursors: 0,
            })),
        }
    }

    /// The sample fixture: three rows with an empty date `datestamp` field,
    /// a text `name`, and an integer `count`.
    pub fn sample() -> Self {
        let datestamp = FieldName::new("datestamp").unwrap();
        let name = FieldName::new("name").unwrap();
        let count = FieldName::new("count").unwrap();

        let table = Self::new(
            "testing_data",
            vec![
                FieldDef::new(datestamp, FieldType::Date),
                FieldDef::new(name.clone(), FieldType::Text),
                FieldDef::new(count.clone(), FieldType::Integer),
            ],
        );
        for (label, n) in [("alpha", 1), ("beta", 2), ("gamma", 3)] {
            table.insert_row(vec![
                (name.clone(), Value::Text(label.to_string())),
                (count.clone(), Value::Integer(n)),
            ]);
        }
        table
    }

    /// Insert a row, filling undeclared values with `Null`.
    ///
    /// Returns the assigned row id.
    pub fn insert_row(&self, values: Vec<(FieldName, Value)>) -> RowId {
        let mut inner = self.inner.lock().unwrap();

        let id = RowId(inner.next_row_id);
        inner.next_row_id += 1;

        let mut row_values: BTreeMap<FieldName, Value> = inner
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect();
        for (field, value) in values {
            row_values.insert(field, value);
        }

        inner.rows.push(MemoryRow {
            id,
            values: row_values,
        });
        id
    }

    /// Configure the table to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldwork::source::memory::{FailOn, MemoryTable};
    /// use fieldwork::source::CursorError;
    ///
    /// let table = MemoryTable::sample().fail_on(FailOn::WriteStep {
    ///     step: 3,
    ///     error: CursorError::WriteFailed("disk full".into()),
    /// });
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<SourceOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Number of cursors currently open (for release assertions).
    pub fn open_cursor_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.open_cursors
    }

    /// Read a row's value for a field (for test verification).
    pub fn value(&self, row: RowId, field: &FieldName) -> Option<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .rows
            .iter()
            .find(|r| r.id == row)
            .and_then(|r| r.values.get(field).cloned())
    }

    /// All row ids, in source order (for test verification).
    pub fn row_ids(&self) -> Vec<RowId> {
        let inner = self.inner.lock().unwrap();
        inner.rows.iter().map(|r| r.id).collect()
    }

    /// Record an operation.
    fn record(&self, op: SourceOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }
}

impl RecordSource for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Result<Vec<FieldDef>, SourceError> {
        self.record(SourceOperation::Fields);

        let inner = self.inner.lock().unwrap();
        if let Some(FailOn::Fields(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner.fields.clone())
    }

    fn count_records(&self) -> Result<u64, SourceError> {
        self.record(SourceOperation::CountRecords);

        let inner = self.inner.lock().unwrap();
        if let Some(FailOn::CountRecords(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner.rows.len() as u64)
    }

    fn open_cursor<'a>(
        &'a self,
        field: &FieldName,
    ) -> Result<Box<dyn UpdateCursor + 'a>, SourceError> {
        self.record(SourceOperation::OpenCursor {
            field: field.clone(),
        });

        let mut inner = self.inner.lock().unwrap();
        if let Some(FailOn::OpenCursor(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        if !inner.fields.iter().any(|f| &f.name == field) {
            return Err(SourceError::Internal(format!(
                "cursor opened on unknown field '{}'",
                field
            )));
        }
        inner.open_cursors += 1;
        drop(inner);

        Ok(Box::new(MemoryCursor {
            inner: Arc::clone(&self.inner),
            field: field.clone(),
            pos: 0,
            current: None,
            reads: 0,
            writes: 0,
        }))
    }
}

/// Scoped cursor over a `MemoryTable`.
///
/// Decrements the table's open-cursor count on drop.
struct MemoryCursor {
    inner: Arc<Mutex<MemoryInner>>,
    field: FieldName,
    pos: usize,
    current: Option<RowId>,
    reads: u64,
    writes: u64,
}

impl UpdateCursor for MemoryCursor {
    fn read_next(&mut self) -> Result<Option<(RowId, Value)>, CursorError> {
        self.reads += 1;
        let step = self.reads;

        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(SourceOperation::ReadNext { step });

        if let Some(FailOn::ReadStep { step: at, error }) = &inner.fail_on {
            if *at == step {
                let error = error.clone();
                drop(inner);
                self.current = None;
                return Err(error);
            }
        }

        match inner.rows.get(self.pos) {
            Some(row) => {
                let id = row.id;
                let value = row.values.get(&self.field).cloned().unwrap_or(Value::Null);
                drop(inner);
                self.pos += 1;
                self.current = Some(id);
                Ok(Some((id, value)))
            }
            None => {
                drop(inner);
                self.current = None;
                Ok(None)
            }
        }
    }

    fn write_current(&mut self, value: Value) -> Result<(), CursorError> {
        let row_id = self.current.ok_or(CursorError::NoCurrentRow)?;
        self.writes += 1;
        let step = self.writes;

        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(SourceOperation::WriteCurrent {
            row_id,
            value: value.clone(),
        });

        if let Some(FailOn::WriteStep { step: at, error }) = &inner.fail_on {
            if *at == step {
                return Err(error.clone());
            }
        }

        let field = self.field.clone();
        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.id == row_id)
            .ok_or_else(|| CursorError::WriteFailed(format!("row {} vanished", row_id)))?;
        row.values.insert(field, value);
        Ok(())
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        // Best-effort release on drop - a poisoned lock means the test
        // is already failing.
        if let Ok(mut inner) = self.inner.lock() {
            inner.open_cursors = inner.open_cursors.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datestamp() -> FieldName {
        FieldName::new("datestamp").unwrap()
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let table = MemoryTable::sample();
        let ids = table.row_ids();
        assert_eq!(ids, vec![RowId(1), RowId(2), RowId(3)]);

        let next = table.insert_row(vec![]);
        assert_eq!(next, RowId(4));
    }

    #[test]
    fn sample_rows_start_with_null_datestamp() {
        let table = MemoryTable::sample();
        for id in table.row_ids() {
            assert_eq!(table.value(id, &datestamp()), Some(Value::Null));
        }
    }

    #[test]
    fn cursor_reads_rows_in_order() {
        let table = MemoryTable::sample();
        let mut cursor = table.open_cursor(&datestamp()).unwrap();

        let mut seen = Vec::new();
        while let Some((id, _)) = cursor.read_next().unwrap() {
            seen.push(id);
        }
        assert_eq!(seen, table.row_ids());
    }

    #[test]
    fn write_current_persists_value() {
        let table = MemoryTable::sample();
        {
            let mut cursor = table.open_cursor(&datestamp()).unwrap();
            let (id, _) = cursor.read_next().unwrap().unwrap();
            let date = FieldType::Date.parse_value("2021-07-08").unwrap();
            cursor.write_current(date.clone()).unwrap();
            assert_eq!(table.value(id, &datestamp()), Some(date));
        }
    }

    #[test]
    fn write_before_read_fails() {
        let table = MemoryTable::sample();
        let mut cursor = table.open_cursor(&datestamp()).unwrap();
        let result = cursor.write_current(Value::Null);
        assert_eq!(result, Err(CursorError::NoCurrentRow));
    }

    #[test]
    fn write_after_end_of_sequence_fails() {
        let table = MemoryTable::new(
            "empty",
            vec![FieldDef::new(datestamp(), FieldType::Date)],
        );
        let mut cursor = table.open_cursor(&datestamp()).unwrap();
        assert_eq!(cursor.read_next().unwrap(), None);
        assert_eq!(
            cursor.write_current(Value::Null),
            Err(CursorError::NoCurrentRow)
        );
    }

    #[test]
    fn open_cursor_count_tracks_release() {
        let table = MemoryTable::sample();
        assert_eq!(table.open_cursor_count(), 0);
        {
            let _cursor = table.open_cursor(&datestamp()).unwrap();
            assert_eq!(table.open_cursor_count(), 1);
        }
        assert_eq!(table.open_cursor_count(), 0);
    }

    #[test]
    fn open_cursor_unknown_field_is_internal_error() {
        let table = MemoryTable::sample();
        let bogus = FieldName::new("bogus").unwrap();
        assert!(matches!(
            table.open_cursor(&bogus),
            Err(SourceError::Internal(_))
        ));
    }

    #[test]
    fn fail_on_count_records() {
        let table = MemoryTable::sample()
            .fail_on(FailOn::CountRecords(SourceError::ReadFailed("io".into())));
        assert_eq!(
            table.count_records(),
            Err(SourceError::ReadFailed("io".into()))
        );
    }

    #[test]
    fn fail_on_write_step_leaves_earlier_writes() {
        let table = MemoryTable::sample().fail_on(FailOn::WriteStep {
            step: 2,
            error: CursorError::WriteFailed("disk full".into()),
        });
        let date = FieldType::Date.parse_value("2021-07-08").unwrap();

        let mut cursor = table.open_cursor(&datestamp()).unwrap();

        let (first, _) = cursor.read_next().unwrap().unwrap();
        cursor.write_current(date.clone()).unwrap();

        let (second, _) = cursor.read_next().unwrap().unwrap();
        let result = cursor.write_current(date.clone());
        assert_eq!(result, Err(CursorError::WriteFailed("disk full".into())));
        drop(cursor);

        assert_eq!(table.value(first, &datestamp()), Some(date));
        assert_eq!(table.value(second, &datestamp()), Some(Value::Null));
    }

    #[test]
    fn fail_on_read_step() {
        let table = MemoryTable::sample().fail_on(FailOn::ReadStep {
            step: 2,
            error: CursorError::ReadFailed("torn page".into()),
        });
        let mut cursor = table.open_cursor(&datestamp()).unwrap();

        assert!(cursor.read_next().unwrap().is_some());
        assert_eq!(
            cursor.read_next(),
            Err(CursorError::ReadFailed("torn page".into()))
        );
    }

    #[test]
    fn operations_recorded() {
        let table = MemoryTable::sample();
        let _ = table.count_records();
        let _ = table.fields();

        let ops = table.operations();
        assert!(matches!(ops[0], SourceOperation::CountRecords));
        assert!(matches!(ops[1], SourceOperation::Fields));
    }

    #[test]
    fn clear_fail_on_restores_behavior() {
        let table = MemoryTable::sample()
            .fail_on(FailOn::CountRecords(SourceError::ReadFailed("io".into())));
        assert!(table.count_records().is_err());

        table.clear_fail_on();
        assert_eq!(table.count_records().unwrap(), 3);
    }
}
