//! Fieldwork - batch field mutation tools for tabular record sources
//!
//! Fieldwork is a single-binary toolbox of didactic example tools, each a
//! thin shim over one reusable worker: the batch field mutator, which
//! rewrites one field in every row of an external record source with
//! per-row commits, progress reporting, and partial-failure visibility.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to workers)
//! - [`core`] - Domain types and the declarative tool-parameter schema
//! - [`mutator`] - The batch field mutator and its progress-reporting seam
//! - [`source`] - Record-source abstraction plus an in-memory implementation
//! - [`store`] - File-backed table storage with per-row durable commits
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! Fieldwork maintains the following invariants:
//!
//! 1. Validation failures are detected before any row is mutated
//! 2. Each committed row write is durable before the next row begins
//! 3. A mid-pass failure never rolls back already-committed rows
//! 4. The scoped cursor is released on every exit path

pub mod cli;
pub mod core;
pub mod mutator;
pub mod source;
pub mod store;
pub mod ui;
