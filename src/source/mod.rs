//! source
//!
//! Record-source abstraction: the seam between the batch mutator and
//! whatever engine actually owns the rows.
//!
//! # Design
//!
//! The [`RecordSource`] trait is the **single doorway** to row storage.
//! The mutator never touches an engine directly; it sees an ordered
//! collection of attribute-bearing rows behind this trait, plus a scoped
//! [`UpdateCursor`] for one read-write pass. Implementations normalize
//! their engine's failures into the typed categories below.
//!
//! # Cursor lifecycle
//!
//! A cursor is a scoped iteration handle: it grants read-write access to
//! the source for one pass and is guaranteed released on every exit path
//! via `Drop`: early return, abort, and panic unwinding included.
//! Implementations that need exclusivity (a file lock, an engine session)
//! acquire it in `open_cursor` and release it in their `Drop`.
//!
//! # Error Handling
//!
//! "Not found" and "transient read failure" are distinct variants, never
//! conflated behind a catch-all:
//! - [`SourceError::NotFound`]: the source (or its backing file) is absent
//! - [`SourceError::ReadFailed`]: the source exists but could not be read
//! - [`SourceError::Locked`]: another pass holds the source's exclusivity

use thiserror::Error;

use crate::core::types::{FieldName, FieldType, RowId, Value};

pub mod memory;

pub use memory::MemoryTable;

/// Errors from record-source operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// The source does not exist.
    #[error("source not found: {0}")]
    NotFound(String),

    /// Another pass holds the source's exclusivity.
    #[error("source is locked: {0}")]
    Locked(String),

    /// The source exists but reading it failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Internal engine error.
    #[error("source error: {0}")]
    Internal(String),
}

/// Errors from cursor operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CursorError {
    /// Failed to read the next row.
    #[error("row read failed: {0}")]
    ReadFailed(String),

    /// Failed to commit the current row's new value.
    #[error("row write failed: {0}")]
    WriteFailed(String),

    /// `write_current` called before any row was read.
    #[error("no current row")]
    NoCurrentRow,
}

/// Declaration of one field on a record source.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDef {
    /// The field's name.
    pub name: FieldName,
    /// The field's declared type.
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl FieldDef {
    /// Convenience constructor.
    pub fn new(name: FieldName, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// An ordered, externally-owned collection of attribute-bearing rows.
///
/// The mutator holds a source only for the duration of one pass and
/// assumes exclusive ownership for that duration; concurrent external
/// writers produce undefined per-row outcomes (a documented limitation,
/// not handled here).
pub trait RecordSource {
    /// Display name of the source (for error messages and labels).
    fn name(&self) -> &str;

    /// Field schema of the source.
    ///
    /// # Errors
    ///
    /// - [`SourceError::NotFound`] if the source is absent
    /// - [`SourceError::ReadFailed`] if the schema could not be read
    fn fields(&self) -> Result<Vec<FieldDef>, SourceError>;

    /// Total row count, captured once before iteration begins.
    ///
    /// The count is not re-validated mid-pass; iteration under concurrent
    /// external mutation is not guaranteed consistent.
    fn count_records(&self) -> Result<u64, SourceError>;

    /// Open a scoped read-write iteration handle restricted to the
    /// identifier column and the named field (minimizing transferred data).
    ///
    /// The handle is released when dropped, on every exit path.
    ///
    /// # Errors
    ///
    /// - [`SourceError::NotFound`] if the source is absent
    /// - [`SourceError::Locked`] if another pass holds the source
    fn open_cursor<'a>(
        &'a self,
        field: &FieldName,
    ) -> Result<Box<dyn UpdateCursor + 'a>, SourceError>;
}

/// A scoped read-write iteration handle over one record source.
///
/// At most one row mutation is outstanding at a time: `write_current`
/// commits the row returned by the preceding `read_next` immediately,
/// before the next row is read.
pub trait UpdateCursor {
    /// Read the next row: its id and the current value of the cursor's
    /// field. Returns `Ok(None)` at end of sequence.
    fn read_next(&mut self) -> Result<Option<(RowId, Value)>, CursorError>;

    /// Commit a new value into the current row's field slot immediately.
    ///
    /// The write is durable before this method returns.
    ///
    /// # Errors
    ///
    /// - [`CursorError::NoCurrentRow`] if called before `read_next`
    /// - [`CursorError::WriteFailed`] if the commit failed
    fn write_current(&mut self, value: Value) -> Result<(), CursorError>;
}
