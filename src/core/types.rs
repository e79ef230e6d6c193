//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RowId`] - Stable integer row identifier assigned by the record source
//! - [`FieldName`] - Validated attribute field name
//! - [`FieldType`] - Declared type of a field's attribute slot
//! - [`Value`] - A typed attribute value
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use fieldwork::core::types::{FieldName, FieldType, Value};
//!
//! // Valid constructions
//! let field = FieldName::new("datestamp").unwrap();
//! assert_eq!(field.as_str(), "datestamp");
//!
//! let value = FieldType::Date.parse_value("2021-07-08").unwrap();
//! assert_eq!(value.to_string(), "2021-07-08");
//!
//! // Invalid constructions fail at creation time
//! assert!(FieldName::new("").is_err());
//! assert!(FieldName::new("1st_field").is_err());
//! assert!(FieldType::Date.parse_value("not-a-date").is_err());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field name: {0}")]
    InvalidFieldName(String),

    #[error("cannot parse '{input}' as {expected}")]
    UnparseableValue {
        /// The input string that failed to parse
        input: String,
        /// The field type it was parsed against
        expected: FieldType,
    },
}

/// A stable row identifier assigned by the record source.
///
/// Row ids are opaque to the mutator: it never generates them, it only
/// carries them from `read_next` into outcomes and progress labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated attribute field name.
///
/// Field names follow the common tabular-store rules:
/// - Cannot be empty
/// - ASCII alphanumeric and `_` only
/// - Cannot start with a digit
///
/// # Example
///
/// ```
/// use fieldwork::core::types::FieldName;
///
/// let name = FieldName::new("datestamp").unwrap();
/// assert_eq!(name.as_str(), "datestamp");
///
/// assert!(FieldName::new("").is_err());
/// assert!(FieldName::new("has space").is_err());
/// assert!(FieldName::new("9lives").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl FieldName {
    /// Create a new validated field name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFieldName` if the name violates the rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();

        if name.is_empty() {
            return Err(TypeError::InvalidFieldName("name is empty".to_string()));
        }
        if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Err(TypeError::InvalidFieldName(format!(
                "'{}' starts with a digit",
                name
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TypeError::InvalidFieldName(format!(
                "'{}' contains characters outside [A-Za-z0-9_]",
                name
            )));
        }

        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for FieldName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldName> for String {
    fn from(name: FieldName) -> Self {
        name.0
    }
}

/// The declared type of a field's attribute slot.
///
/// The type governs which [`Value`]s may be written into the field.
/// `Value::Null` is writable into any field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Real,
    /// UTF-8 text.
    Text,
    /// Calendar date, `%Y-%m-%d`.
    Date,
}

impl FieldType {
    /// Parse a string input into a value of this type.
    ///
    /// An empty input parses to `Value::Null` for every field type.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::UnparseableValue` if the input does not parse.
    pub fn parse_value(&self, input: &str) -> Result<Value, TypeError> {
        if input.is_empty() {
            return Ok(Value::Null);
        }

        let unparseable = || TypeError::UnparseableValue {
            input: input.to_string(),
            expected: *self,
        };

        match self {
            FieldType::Integer => input
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| unparseable()),
            FieldType::Real => input
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| unparseable()),
            FieldType::Text => Ok(Value::Text(input.to_string())),
            FieldType::Date => NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| unparseable()),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Integer => write!(f, "integer"),
            FieldType::Real => write!(f, "real"),
            FieldType::Text => write!(f, "text"),
            FieldType::Date => write!(f, "date"),
        }
    }
}

/// A typed attribute value.
///
/// Serialized with an explicit type tag so that a date and a text value
/// that happens to look like a date stay distinguishable in table files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// No value. Writable into any field type.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// The field type this value is compatible with, or `None` for `Null`.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(FieldType::Integer),
            Value::Real(_) => Some(FieldType::Real),
            Value::Text(_) => Some(FieldType::Text),
            Value::Date(_) => Some(FieldType::Date),
        }
    }

    /// Check whether this value may be written into a field of `ty`.
    ///
    /// `Null` is compatible with every field type.
    pub fn compatible_with(&self, ty: FieldType) -> bool {
        match self.field_type() {
            None => true,
            Some(actual) => actual == ty,
        }
    }

    /// True if this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}
