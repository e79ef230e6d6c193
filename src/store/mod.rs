//! store
//!
//! File-backed table storage.
//!
//! # Architecture
//!
//! `TableStore` is the **single doorway** to on-disk tables. A table is
//! one JSON file holding its name, field schema, and rows; no other
//! module reads or writes table files directly. The store normalizes
//! filesystem failures into typed categories and implements
//! [`RecordSource`] so the mutator never knows it is talking to a file.
//!
//! # Durability
//!
//! Every row commit rewrites the table atomically (temp file + rename),
//! so a committed row is durable before the next row begins and a crash
//! mid-pass never leaves a torn file - only the old or the new contents.
//!
//! # Exclusivity
//!
//! Opening a cursor acquires an exclusive advisory lock
//! ([`lock::TableLock`]) held for the pass and released with the cursor,
//! on every exit path.
//!
//! # Error Handling
//!
//! "Not found" and "transient read failure" are distinct:
//! - [`StoreError::NotFound`]: the table file is absent
//! - [`StoreError::ReadError`]: the file exists but could not be read
//! - [`StoreError::ParseError`]: the file read but did not parse

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{FieldName, RowId, Value};
use crate::source::{CursorError, FieldDef, RecordSource, SourceError, UpdateCursor};

pub mod lock;

pub use lock::{LockError, TableLock};

/// Errors from table-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The table file does not exist.
    #[error("table not found: {path}")]
    NotFound {
        /// The path that was searched
        path: PathBuf,
    },

    /// A table file already exists at the target path.
    #[error("table already exists: {path}")]
    AlreadyExists {
        /// The path that was refused
        path: PathBuf,
    },

    /// The table file exists but reading it failed.
    #[error("failed to read table '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The table file read but did not parse or validate.
    #[error("failed to parse table '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    /// Failed to write the table file.
    #[error("failed to write table '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A value does not match its field's declared type.
    #[error("value for field '{field}' does not match its declared type")]
    ValueType {
        /// The offending field
        field: FieldName,
    },

    /// The named field is not declared on the table.
    #[error("unknown field: {0}")]
    UnknownField(FieldName),

    /// Another pass holds the table's lock.
    #[error(transparent)]
    Locked(#[from] LockError),
}

/// On-disk table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    /// Table display name.
    name: String,
    /// Field schema.
    fields: Vec<FieldDef>,
    /// Next row id to assign.
    next_row_id: i64,
    /// Rows, in stable on-disk order.
    rows: Vec<StoredRow>,
}

/// One on-disk row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredRow {
    id: RowId,
    values: BTreeMap<FieldName, Value>,
}

/// A read-only view of a table, for display.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    /// Table display name.
    pub name: String,
    /// Field schema, in declaration order.
    pub fields: Vec<FieldDef>,
    /// Rows, in table order.
    pub rows: Vec<RowSnapshot>,
}

/// One row of a [`TableSnapshot`].
#[derive(Debug, Clone)]
pub struct RowSnapshot {
    /// The row's id.
    pub id: RowId,
    /// The row's values, keyed by field name.
    pub values: BTreeMap<FieldName, Value>,
}

/// Handle to one file-backed table.
///
/// Cheap to construct; every operation reads the file fresh, so two
/// handles to the same path observe each other's committed writes.
#[derive(Debug, Clone)]
pub struct TableStore {
    /// Path of the table file.
    path: PathBuf,
    /// Cached display name, read at open.
    name: String,
}

impl TableStore {
    /// Open an existing table file.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the file is absent
    /// - [`StoreError::ReadError`] / [`StoreError::ParseError`] if it
    ///   cannot be read or does not validate
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let table = load_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            name: table.name,
        })
    }

    /// Create a new table file with the given name and field schema.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if a file is already at `path`
    /// - [`StoreError::WriteError`] if the file cannot be written
    pub fn create(path: &Path, name: &str, fields: Vec<FieldDef>) -> Result<Self, StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let table = TableFile {
            name: name.to_string(),
            fields,
            next_row_id: 1,
            rows: Vec::new(),
        };
        validate_file(path, &table)?;
        save_file(path, &table)?;

        Ok(Self {
            path: path.to_path_buf(),
            name: name.to_string(),
        })
    }

    /// Path of the table file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a row; unspecified fields are filled with `Null`.
    ///
    /// Returns the assigned row id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownField`] if a value names an undeclared field
    /// - [`StoreError::ValueType`] if a value does not match its field's
    ///   declared type
    pub fn insert_row(&self, values: Vec<(FieldName, Value)>) -> Result<RowId, StoreError> {
        let mut table = load_file(&self.path)?;

        let mut row_values: BTreeMap<FieldName, Value> = table
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect();
        for (field, value) in values {
            let def = table
                .fields
                .iter()
                .find(|f| f.name == field)
                .ok_or_else(|| StoreError::UnknownField(field.clone()))?;
            if !value.compatible_with(def.ty) {
                return Err(StoreError::ValueType { field });
            }
            row_values.insert(field, value);
        }

        let id = RowId(table.next_row_id);
        table.next_row_id += 1;
        table.rows.push(StoredRow {
            id,
            values: row_values,
        });
        save_file(&self.path, &table)?;
        Ok(id)
    }

    /// Read the whole table for display.
    pub fn snapshot(&self) -> Result<TableSnapshot, StoreError> {
        let table = load_file(&self.path)?;
        Ok(TableSnapshot {
            name: table.name,
            fields: table.fields,
            rows: table
                .rows
                .into_iter()
                .map(|r| RowSnapshot {
                    id: r.id,
                    values: r.values,
                })
                .collect(),
        })
    }
}

impl RecordSource for TableStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Result<Vec<FieldDef>, SourceError> {
        let table = load_file(&self.path).map_err(store_to_source)?;
        Ok(table.fields)
    }

    fn count_records(&self) -> Result<u64, SourceError> {
        let table = load_file(&self.path).map_err(store_to_source)?;
        Ok(table.rows.len() as u64)
    }

    fn open_cursor<'a>(
        &'a self,
        field: &FieldName,
    ) -> Result<Box<dyn UpdateCursor + 'a>, SourceError> {
        let lock = TableLock::acquire(&self.path).map_err(|e| match e {
            LockError::AlreadyLocked => SourceError::Locked(self.name.clone()),
            other => SourceError::Internal(other.to_string()),
        })?;

        let table = load_file(&self.path).map_err(store_to_source)?;
        if !table.fields.iter().any(|f| &f.name == field) {
            return Err(SourceError::Internal(format!(
                "cursor opened on unknown field '{}'",
                field
            )));
        }

        Ok(Box::new(StoreCursor {
            path: self.path.clone(),
            table,
            field: field.clone(),
            pos: 0,
            current: None,
            _lock: lock,
        }))
    }
}

/// Scoped cursor over one table file.
///
/// Holds the table lock for the pass; the lock is released when the
/// cursor drops, on every exit path.
struct StoreCursor {
    path: PathBuf,
    table: TableFile,
    field: FieldName,
    pos: usize,
    current: Option<usize>,
    _lock: TableLock,
}

impl UpdateCursor for StoreCursor {
    fn read_next(&mut self) -> Result<Option<(RowId, Value)>, CursorError> {
        match self.table.rows.get(self.pos) {
            Some(row) => {
                let id = row.id;
                let value = row.values.get(&self.field).cloned().unwrap_or(Value::Null);
                self.current = Some(self.pos);
                self.pos += 1;
                Ok(Some((id, value)))
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    fn write_current(&mut self, value: Value) -> Result<(), CursorError> {
        let index = self.current.ok_or(CursorError::NoCurrentRow)?;
        let field = self.field.clone();

        let row = self
            .table
            .rows
            .get_mut(index)
            .ok_or_else(|| CursorError::WriteFailed("current row vanished".to_string()))?;
        let previous = row.values.insert(field.clone(), value);

        // Commit immediately; on failure, restore the in-memory row so
        // the file and the cursor's view stay in agreement.
        if let Err(e) = save_file(&self.path, &self.table) {
            let row = &mut self.table.rows[index];
            match previous {
                Some(v) => {
                    row.values.insert(field, v);
                }
                None => {
                    row.values.remove(&field);
                }
            }
            return Err(CursorError::WriteFailed(e.to_string()));
        }
        Ok(())
    }
}

/// Load and validate a table file.
fn load_file(path: &Path) -> Result<TableFile, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let table: TableFile = serde_json::from_str(&content).map_err(|e| StoreError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate_file(path, &table)?;
    Ok(table)
}

/// Structural validation beyond what serde enforces.
fn validate_file(path: &Path, table: &TableFile) -> Result<(), StoreError> {
    let parse_error = |message: String| StoreError::ParseError {
        path: path.to_path_buf(),
        message,
    };

    let mut seen = std::collections::BTreeSet::new();
    for field in &table.fields {
        if !seen.insert(&field.name) {
            return Err(parse_error(format!("duplicate field '{}'", field.name)));
        }
    }

    for row in &table.rows {
        for (name, value) in &row.values {
            let def = table
                .fields
                .iter()
                .find(|f| &f.name == name)
                .ok_or_else(|| {
                    parse_error(format!("row {} has undeclared field '{}'", row.id, name))
                })?;
            if !value.compatible_with(def.ty) {
                return Err(parse_error(format!(
                    "row {} field '{}' does not match declared type {}",
                    row.id, name, def.ty
                )));
            }
        }
    }

    Ok(())
}

/// Write a table file atomically: temp file in the same directory, then
/// rename over the target.
fn save_file(path: &Path, table: &TableFile) -> Result<(), StoreError> {
    let write_error = |source: std::io::Error| StoreError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(table).map_err(|e| StoreError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let tmp = tmp_path(path);
    fs::write(&tmp, json).map_err(write_error)?;
    fs::rename(&tmp, path).map_err(write_error)?;
    Ok(())
}

/// Temp file path: the table path with `.tmp` appended.
fn tmp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Map store failures into the record-source taxonomy.
fn store_to_source(e: StoreError) -> SourceError {
    match e {
        StoreError::NotFound { path } => SourceError::NotFound(path.display().to_string()),
        StoreError::ReadError { source, .. } => SourceError::ReadFailed(source.to_string()),
        StoreError::ParseError { message, .. } => SourceError::ReadFailed(message),
        StoreError::Locked(_) => SourceError::Locked("table".to_string()),
        other => SourceError::Internal(other.to_string()),
    }
}
