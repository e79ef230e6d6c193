//! core::params
//!
//! Declarative tool-parameter schema.
//!
//! # Overview
//!
//! Every tool declares its parameters as data: name, datatype, requirement,
//! direction, default, constraints. The declaration replaces per-tool UI
//! boilerplate. A UI layer (or the CLI itself) reads the spec to render and
//! validate inputs before the worker function runs.
//!
//! # Validation
//!
//! Specs are validated after parsing (non-empty names, constraints that make
//! sense for the datatype). Supplied argument values are then checked
//! against the spec: required parameters present, values parseable for
//! their datatype, constraints satisfied.
//!
//! # Example
//!
//! ```toml
//! name = "update"
//! label = "Field Update tool"
//! description = "Update a field in every row of a table."
//! category = "Example"
//!
//! [[parameters]]
//! name = "table"
//! display_name = "Table (NOTE, contents will be modified!)"
//! datatype = "table"
//! requirement = "required"
//! direction = "input"
//!
//! [[parameters]]
//! name = "field"
//! display_name = "Name of the field to update"
//! datatype = "field"
//! requirement = "required"
//! direction = "input"
//! depends_on = "table"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::FieldName;

/// Errors from parameter schema operations.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("failed to read spec file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse spec file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid tool spec: {0}")]
    InvalidSpec(String),

    #[error("missing required parameter: {0}")]
    MissingRequired(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("invalid value for parameter '{parameter}': {message}")]
    InvalidValue { parameter: String, message: String },
}

/// Datatype of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Path to a record source table.
    Table,
    /// Name of a field on a table parameter.
    Field,
    /// Calendar date, `%Y-%m-%d`.
    Date,
    /// 64-bit signed integer.
    Long,
    /// 64-bit floating point.
    Double,
    /// Free-form text.
    String,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Table => write!(f, "table"),
            ParamType::Field => write!(f, "field"),
            ParamType::Date => write!(f, "date"),
            ParamType::Long => write!(f, "long"),
            ParamType::Double => write!(f, "double"),
            ParamType::String => write!(f, "string"),
        }
    }
}

/// Whether a parameter must be supplied, may be supplied, or is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// Must be supplied (or have a default).
    #[default]
    Required,
    /// May be omitted.
    Optional,
    /// Computed by the tool; never supplied by the caller.
    Derived,
}

/// Direction of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Consumed by the tool.
    #[default]
    Input,
    /// Produced by the tool.
    Output,
}

/// A value constraint on a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Constraint {
    /// Numeric value must lie within `[min, max]` inclusive.
    Range { min: f64, max: f64 },
    /// Value must be one of the listed strings.
    ValueList { values: Vec<String> },
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    /// Identifier used when supplying a value.
    pub name: String,

    /// Human-readable label for UI layers.
    pub display_name: String,

    /// Datatype governing how the value parses.
    pub datatype: ParamType,

    /// Required, optional, or derived.
    #[serde(default)]
    pub requirement: Requirement,

    /// Input or output.
    #[serde(default)]
    pub direction: Direction,

    /// Default value used when the parameter is omitted.
    #[serde(default)]
    pub default: Option<String>,

    /// Optional value constraint.
    #[serde(default)]
    pub constraint: Option<Constraint>,

    /// Name of a parameter this one depends on (e.g., a field parameter
    /// whose choices come from a table parameter).
    #[serde(default)]
    pub depends_on: Option<String>,
}

impl ParameterSpec {
    /// Check a supplied value against this parameter's datatype and constraint.
    fn check_value(&self, value: &str) -> Result<(), ParamError> {
        let invalid = |message: String| ParamError::InvalidValue {
            parameter: self.name.clone(),
            message,
        };

        match self.datatype {
            ParamType::Table => {
                if value.is_empty() {
                    return Err(invalid("table path is empty".to_string()));
                }
            }
            ParamType::Field => {
                FieldName::new(value).map_err(|e| invalid(e.to_string()))?;
            }
            ParamType::Date => {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map_err(|_| invalid(format!("'{}' is not a %Y-%m-%d date", value)))?;
            }
            ParamType::Long => {
                value
                    .parse::<i64>()
                    .map_err(|_| invalid(format!("'{}' is not an integer", value)))?;
            }
            ParamType::Double => {
                value
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("'{}' is not a number", value)))?;
            }
            ParamType::String => {}
        }

        if let Some(constraint) = &self.constraint {
            match constraint {
                Constraint::Range { min, max } => {
                    let n: f64 = value
                        .parse()
                        .map_err(|_| invalid(format!("'{}' is not numeric", value)))?;
                    if n < *min || n > *max {
                        return Err(invalid(format!(
                            "{} is outside the range {}-{}",
                            n, min, max
                        )));
                    }
                }
                Constraint::ValueList { values } => {
                    if !values.iter().any(|v| v == value) {
                        return Err(invalid(format!(
                            "'{}' is not one of: {}",
                            value,
                            values.join(", ")
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Declaration of one tool: identity plus an ordered parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    /// Tool identifier (the subcommand name).
    pub name: String,

    /// Human-readable label.
    pub label: String,

    /// One-paragraph description.
    pub description: String,

    /// Toolbox category.
    #[serde(default)]
    pub category: Option<String>,

    /// Ordered parameter declarations.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSpec {
    /// Load a tool spec from a TOML file.
    ///
    /// # Errors
    ///
    /// - `ParamError::ReadError` if the file cannot be read
    /// - `ParamError::ParseError` if the TOML does not parse
    /// - `ParamError::InvalidSpec` if the parsed spec fails validation
    pub fn load(path: &Path) -> Result<Self, ParamError> {
        let content = fs::read_to_string(path).map_err(|source| ParamError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let spec: ToolSpec = toml::from_str(&content).map_err(|e| ParamError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the spec itself.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidSpec` describing the first problem found.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.name.is_empty() {
            return Err(ParamError::InvalidSpec("tool name is empty".to_string()));
        }

        let mut seen = std::collections::BTreeSet::new();
        for param in &self.parameters {
            if param.name.is_empty() {
                return Err(ParamError::InvalidSpec(format!(
                    "tool '{}' has a parameter with an empty name",
                    self.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(ParamError::InvalidSpec(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            if let Some(Constraint::Range { min, max }) = &param.constraint {
                if min > max {
                    return Err(ParamError::InvalidSpec(format!(
                        "parameter '{}' has an inverted range {}-{}",
                        param.name, min, max
                    )));
                }
                if !matches!(param.datatype, ParamType::Long | ParamType::Double) {
                    return Err(ParamError::InvalidSpec(format!(
                        "parameter '{}' has a range constraint on non-numeric type {}",
                        param.name, param.datatype
                    )));
                }
            }
            if let Some(dep) = &param.depends_on {
                if !self.parameters.iter().any(|p| &p.name == dep) {
                    return Err(ParamError::InvalidSpec(format!(
                        "parameter '{}' depends on unknown parameter '{}'",
                        param.name, dep
                    )));
                }
            }
        }

        Ok(())
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check supplied values against the spec.
    ///
    /// Every required input parameter must be present (or carry a default);
    /// every supplied value must parse for its datatype and satisfy its
    /// constraint. Derived parameters are tool outputs and may not be
    /// supplied.
    ///
    /// # Errors
    ///
    /// Returns the first `ParamError` found, in declaration order.
    pub fn check_values(&self, values: &BTreeMap<String, String>) -> Result<(), ParamError> {
        for name in values.keys() {
            let param = self
                .parameter(name)
                .ok_or_else(|| ParamError::UnknownParameter(name.clone()))?;
            if param.requirement == Requirement::Derived {
                return Err(ParamError::InvalidValue {
                    parameter: name.clone(),
                    message: "derived parameters are computed by the tool".to_string(),
                });
            }
        }

        for param in &self.parameters {
            if param.direction == Direction::Output {
                continue;
            }
            match values.get(&param.name).or(param.default.as_ref()) {
                Some(value) => param.check_value(value)?,
                None => {
                    if param.requirement == Requirement::Required {
                        return Err(ParamError::MissingRequired(param.name.clone()));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> ToolSpec {
        ToolSpec {
            name: "update".to_string(),
            label: "Field Update tool".to_string(),
            description: "Update a field in every row of a table.".to_string(),
            category: Some("Example".to_string()),
            parameters: vec![
                ParameterSpec {
                    name: "table".to_string(),
                    display_name: "Table".to_string(),
                    datatype: ParamType::Table,
                    requirement: Requirement::Required,
                    direction: Direction::Input,
                    default: None,
                    constraint: None,
                    depends_on: None,
                },
                ParameterSpec {
                    name: "field".to_string(),
                    display_name: "Field to update".to_string(),
                    datatype: ParamType::Field,
                    requirement: Requirement::Required,
                    direction: Direction::Input,
                    default: None,
                    constraint: None,
                    depends_on: Some("table".to_string()),
                },
                ParameterSpec {
                    name: "a_number".to_string(),
                    display_name: "A number in the range 100-500".to_string(),
                    datatype: ParamType::Long,
                    requirement: Requirement::Optional,
                    direction: Direction::Input,
                    default: Some("200".to_string()),
                    constraint: Some(Constraint::Range {
                        min: 100.0,
                        max: 500.0,
                    }),
                    depends_on: None,
                },
                ParameterSpec {
                    name: "out_table".to_string(),
                    display_name: "Output table".to_string(),
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

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn valid_spec_passes_validation() {
        assert!(sample_spec().validate().is_ok());
    }

    #[test]
    fn duplicate_parameter_rejected() {
        let mut spec = sample_spec();
        let dup = spec.parameters[0].clone();
        spec.parameters.push(dup);
        assert!(matches!(spec.validate(), Err(ParamError::InvalidSpec(_))));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut spec = sample_spec();
        spec.parameters[2].constraint = Some(Constraint::Range {
            min: 500.0,
            max: 100.0,
        });
        assert!(matches!(spec.validate(), Err(ParamError::InvalidSpec(_))));
    }

    #[test]
    fn unknown_dependency_rejected() {
        let mut spec = sample_spec();
        spec.parameters[1].depends_on = Some("no_such".to_string());
        assert!(matches!(spec.validate(), Err(ParamError::InvalidSpec(_))));
    }

    #[test]
    fn check_values_accepts_complete_input() {
        let spec = sample_spec();
        let vals = values(&[("table", "data.table.json"), ("field", "datestamp")]);
        assert!(spec.check_values(&vals).is_ok());
    }

    #[test]
    fn check_values_missing_required() {
        let spec = sample_spec();
        let vals = values(&[("table", "data.table.json")]);
        assert!(matches!(
            spec.check_values(&vals),
            Err(ParamError::MissingRequired(p)) if p == "field"
        ));
    }

    #[test]
    fn check_values_unparseable_datatype() {
        let spec = sample_spec();
        let vals = values(&[
            ("table", "data.table.json"),
            ("field", "not a field name"),
        ]);
        assert!(matches!(
            spec.check_values(&vals),
            Err(ParamError::InvalidValue { parameter, .. }) if parameter == "field"
        ));
    }

    #[test]
    fn check_values_range_constraint() {
        let spec = sample_spec();
        let ok = values(&[
            ("table", "t.json"),
            ("field", "datestamp"),
            ("a_number", "250"),
        ]);
        assert!(spec.check_values(&ok).is_ok());

        let low = values(&[
            ("table", "t.json"),
            ("field", "datestamp"),
            ("a_number", "99"),
        ]);
        assert!(matches!(
            spec.check_values(&low),
            Err(ParamError::InvalidValue { parameter, .. }) if parameter == "a_number"
        ));
    }

    #[test]
    fn check_values_value_list_constraint() {
        let mut spec = sample_spec();
        spec.parameters.push(ParameterSpec {
            name: "mode".to_string(),
            display_name: "Mode".to_string(),
            datatype: ParamType::String,
            requirement: Requirement::Optional,
            direction: Direction::Input,
            default: None,
            constraint: Some(Constraint::ValueList {
                values: vec!["fast".to_string(), "careful".to_string()],
            }),
            depends_on: None,
        });

        let ok = values(&[
            ("table", "t.json"),
            ("field", "datestamp"),
            ("mode", "careful"),
        ]);
        assert!(spec.check_values(&ok).is_ok());

        let bad = values(&[
            ("table", "t.json"),
            ("field", "datestamp"),
            ("mode", "reckless"),
        ]);
        assert!(spec.check_values(&bad).is_err());
    }

    #[test]
    fn check_values_rejects_supplied_derived() {
        let spec = sample_spec();
        let vals = values(&[
            ("table", "t.json"),
            ("field", "datestamp"),
            ("out_table", "o.json"),
        ]);
        assert!(spec.check_values(&vals).is_err());
    }

    #[test]
    fn check_values_unknown_parameter() {
        let spec = sample_spec();
        let vals = values(&[
            ("table", "t.json"),
            ("field", "datestamp"),
            ("bogus", "1"),
        ]);
        assert!(matches!(
            spec.check_values(&vals),
            Err(ParamError::UnknownParameter(p)) if p == "bogus"
        ));
    }

    #[test]
    fn default_satisfies_constraint_check() {
        let spec = sample_spec();
        // a_number omitted: default "200" is applied and checked.
        let vals = values(&[("table", "t.json"), ("field", "datestamp")]);
        assert!(spec.check_values(&vals).is_ok());
    }

    #[test]
    fn spec_parses_from_toml() {
        let toml_src = r#"
            name = "update"
            label = "Field Update tool"
            description = "Update a field in every row of a table."
            category = "Example"

            [[parameters]]
            name = "table"
            display_name = "Table"
            datatype = "table"
            requirement = "required"
            direction = "input"

            [[parameters]]
            name = "a_number"
            display_name = "A number"
            datatype = "long"
            requirement = "optional"
            default = "200"

            [parameters.constraint]
            kind = "range"
            min = 100.0
            max = 500.0
        "#;

        let spec: ToolSpec = toml::from_str(toml_src).unwrap();
        spec.validate().unwrap();
        assert_eq!(spec.name, "update");
        assert_eq!(spec.parameters.len(), 2);
        assert_eq!(
            spec.parameters[1].constraint,
            Some(Constraint::Range {
                min: 100.0,
                max: 500.0
            })
        );
    }

    #[test]
    fn spec_rejects_unknown_toml_fields() {
        let toml_src = r#"
            name = "x"
            label = "X"
            description = "X."
            stylesheet = "unsupported"
        "#;
        let result: Result<ToolSpec, _> = toml::from_str(toml_src);
        assert!(result.is_err());
    }
}
