//! Argument validation for tool invocations
//!
//! This module evaluates a tool's declared [`InputSchema`] against the
//! arguments supplied by the caller, producing a structured list of issues
//! that the invoker renders as a failure content item. Validation happens
//! before the handler runs; a violation means the handler is never invoked.

use crate::protocol::types::{FieldType, InputSchema};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A single validation problem, tied to the field that caused it
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Name of the offending field
    pub field: String,
    /// What went wrong
    pub problem: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.field, self.problem)
    }
}

/// Outcome of validating arguments against a schema
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// All problems found; empty means the arguments satisfy the schema
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether the arguments satisfied the schema
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// One-line rendering of all issues, for failure content items
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Human-readable type name for a JSON value
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a JSON value satisfies a declared field type
fn matches_type(value: &Value, field_type: FieldType) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array => value.is_array(),
        FieldType::Object => value.is_object(),
    }
}

/// Validate arguments against a schema, reporting every issue found
pub fn validate_arguments(
    arguments: &HashMap<String, Value>,
    schema: &InputSchema,
) -> ValidationReport {
    let mut issues = Vec::new();

    for required in &schema.required {
        if !arguments.contains_key(required) {
            issues.push(ValidationIssue {
                field: required.clone(),
                problem: "missing required parameter".to_string(),
            });
        }
    }

    for (name, value) in arguments {
        match schema.properties.get(name) {
            Some(spec) => {
                if !matches_type(value, spec.field_type) {
                    issues.push(ValidationIssue {
                        field: name.clone(),
                        problem: format!(
                            "expected {}, got {}",
                            spec.field_type.name(),
                            value_type_name(value)
                        ),
                    });
                }
            }
            None => {
                issues.push(ValidationIssue {
                    field: name.clone(),
                    problem: "unknown parameter".to_string(),
                });
            }
        }
    }

    // Stable ordering keeps failure summaries deterministic
    issues.sort_by(|a, b| a.field.cmp(&b.field));
    ValidationReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> InputSchema {
        InputSchema::new()
            .required_field("name", FieldType::String, "User name")
            .required_field("email", FieldType::String, "User email")
            .optional_field("age", FieldType::Integer, "User age")
    }

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_arguments() {
        let report = validate_arguments(
            &args(&[("name", json!("Ada")), ("email", json!("a@b.com"))]),
            &user_schema(),
        );
        assert!(report.is_valid());
    }

    #[test]
    fn test_missing_required() {
        let report = validate_arguments(&args(&[("name", json!("Ada"))]), &user_schema());
        assert!(!report.is_valid());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "email");
        assert!(report.summary().contains("missing required parameter"));
    }

    #[test]
    fn test_wrong_type() {
        let report = validate_arguments(
            &args(&[
                ("name", json!(42)),
                ("email", json!("a@b.com")),
                ("age", json!("old")),
            ]),
            &user_schema(),
        );
        assert_eq!(report.issues.len(), 2);
        // Sorted by field name
        assert_eq!(report.issues[0].field, "age");
        assert!(report.issues[0].problem.contains("expected integer"));
        assert_eq!(report.issues[1].field, "name");
        assert!(report.issues[1].problem.contains("expected string"));
    }

    #[test]
    fn test_unknown_parameter() {
        let report = validate_arguments(
            &args(&[
                ("name", json!("Ada")),
                ("email", json!("a@b.com")),
                ("nickname", json!("ada")),
            ]),
            &user_schema(),
        );
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].problem, "unknown parameter");
    }

    #[test]
    fn test_integer_accepts_whole_numbers_only() {
        let schema = InputSchema::new().required_field("count", FieldType::Integer, "A count");
        assert!(validate_arguments(&args(&[("count", json!(3))]), &schema).is_valid());
        assert!(!validate_arguments(&args(&[("count", json!(3.5))]), &schema).is_valid());
    }

    #[test]
    fn test_empty_schema_rejects_surprise_arguments() {
        let report = validate_arguments(&args(&[("anything", json!(1))]), &InputSchema::new());
        assert!(!report.is_valid());
    }
}
