//! core
//!
//! Core domain types and schemas for Fieldwork.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RowId, FieldName, FieldType, Value
//! - [`params`] - Declarative tool-parameter schema and value checking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Workspace state is threaded through calls, never process-wide

pub mod params;
pub mod types;
