//! Structural contract for test definition documents
//!
//! A document is checked field by field in a fixed order and the first
//! violation is reported. Nothing in a document is used before it passes.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Category of a schema violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A required property is absent
    MissingField,
    /// A value has the wrong JSON type
    TypeMismatch,
    /// The `code` sequence has no entries
    EmptySequence,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::MissingField => "MissingField",
            ViolationKind::TypeMismatch => "TypeMismatch",
            ViolationKind::EmptySequence => "EmptySequence",
        };
        f.write_str(name)
    }
}

/// First violation found in a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {path}")]
pub struct SchemaViolation {
    pub kind: ViolationKind,
    /// JSON path of the offending value, e.g. `$.code[1].name`
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    fn missing(path: &str, field: &str) -> Self {
        Self {
            kind: ViolationKind::MissingField,
            path: path.to_string(),
            message: format!("'{}' is a required property", field),
        }
    }

    fn type_mismatch(path: String, expected: &str, found: &Value) -> Self {
        Self {
            kind: ViolationKind::TypeMismatch,
            path,
            message: format!("expected {}, found {}", expected, type_name(found)),
        }
    }
}

/// Check a document against the test definition contract
pub fn validate(document: &Value) -> Result<(), SchemaViolation> {
    let root = expect_object(document, "$".to_string())?;

    require_string(root, "$", "description")?;

    let code = require(root, "$", "code")?;
    let items = code
        .as_array()
        .ok_or_else(|| SchemaViolation::type_mismatch("$.code".to_string(), "array", code))?;
    if items.is_empty() {
        return Err(SchemaViolation {
            kind: ViolationKind::EmptySequence,
            path: "$.code".to_string(),
            message: "expected at least 1 source file, found none".to_string(),
        });
    }
    for (index, item) in items.iter().enumerate() {
        let path = format!("$.code[{}]", index);
        let file = expect_object(item, path.clone())?;
        require_string(file, &path, "name")?;
        require_string(file, &path, "code")?;
    }

    require_string(root, "$", "stdin")?;

    let expected = require(root, "$", "expected")?;
    let expected = expect_object(expected, "$.expected".to_string())?;
    for field in ["stdout", "stderr", "returncode"] {
        require_string(expected, "$.expected", field)?;
    }

    Ok(())
}

fn expect_object(value: &Value, path: String) -> Result<&Map<String, Value>, SchemaViolation> {
    value
        .as_object()
        .ok_or_else(|| SchemaViolation::type_mismatch(path, "object", value))
}

fn require<'a>(
    object: &'a Map<String, Value>,
    parent: &str,
    field: &str,
) -> Result<&'a Value, SchemaViolation> {
    object
        .get(field)
        .ok_or_else(|| SchemaViolation::missing(parent, field))
}

fn require_string(
    object: &Map<String, Value>,
    parent: &str,
    field: &str,
) -> Result<(), SchemaViolation> {
    let value = require(object, parent, field)?;
    if value.is_string() {
        Ok(())
    } else {
        Err(SchemaViolation::type_mismatch(
            format!("{}.{}", parent, field),
            "string",
            value,
        ))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
