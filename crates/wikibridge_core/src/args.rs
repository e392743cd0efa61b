//! Field-by-field decoding of tool arguments.
//!
//! Every problem is collected with the path of the offending field so the
//! caller sees all of them at once.

use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult, ValidationIssue};
use crate::model::Field;

pub struct ArgReader<'a> {
    fields: Option<&'a Map<String, Value>>,
    issues: Vec<ValidationIssue>,
}

impl<'a> ArgReader<'a> {
    pub fn new(arguments: &'a Value) -> Self {
        match arguments {
            Value::Object(fields) => Self {
                fields: Some(fields),
                issues: Vec::new(),
            },
            Value::Null => Self {
                fields: None,
                issues: Vec::new(),
            },
            _ => Self {
                fields: None,
                issues: vec![ValidationIssue::new("arguments", "expected an object")],
            },
        }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.fields.and_then(|fields| fields.get(key))
    }

    fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    pub fn optional_string(&mut self, key: &str) -> Field<String> {
        match self.raw(key) {
            None => Field::Unset,
            Some(Value::String(value)) => Field::Set(value.clone()),
            Some(other) => {
                self.issue(key, format!("expected a string, got {}", type_name(other)));
                Field::Unset
            }
        }
    }

    pub fn required_string(&mut self, key: &str) -> Option<String> {
        if self.raw(key).is_none() {
            self.issue(key, "is required");
            return None;
        }
        self.optional_string(key).into_option()
    }

    /// Required string that must contain something other than whitespace.
    pub fn required_text(&mut self, key: &str) -> Option<String> {
        let value = self.required_string(key)?;
        if value.trim().is_empty() {
            self.issue(key, "must not be blank");
            return None;
        }
        Some(value)
    }

    /// Optional string that, when present, must not be blank.
    pub fn optional_text(&mut self, key: &str) -> Field<String> {
        match self.optional_string(key) {
            Field::Set(value) if value.trim().is_empty() => {
                self.issue(key, "must not be blank");
                Field::Unset
            }
            other => other,
        }
    }

    pub fn optional_bool(&mut self, key: &str) -> Field<bool> {
        match self.raw(key) {
            None => Field::Unset,
            Some(Value::Bool(value)) => Field::Set(*value),
            Some(other) => {
                self.issue(key, format!("expected a boolean, got {}", type_name(other)));
                Field::Unset
            }
        }
    }

    /// Optional integer constrained to `[min, max]`.
    pub fn optional_int(&mut self, key: &str, min: i64, max: i64) -> Field<i64> {
        match self.raw(key) {
            None => Field::Unset,
            Some(Value::Number(number)) => match number.as_i64() {
                Some(value) if value < min => {
                    self.issue(key, format!("must be at least {min}"));
                    Field::Unset
                }
                Some(value) if value > max => {
                    self.issue(key, format!("must be at most {max}"));
                    Field::Unset
                }
                Some(value) => Field::Set(value),
                None => {
                    self.issue(key, "expected an integer");
                    Field::Unset
                }
            },
            Some(other) => {
                self.issue(key, format!("expected an integer, got {}", type_name(other)));
                Field::Unset
            }
        }
    }

    /// Optional array of strings; each element is checked on its own path.
    pub fn optional_string_list(&mut self, key: &str) -> Field<Vec<String>> {
        match self.raw(key) {
            None => Field::Unset,
            Some(Value::Array(items)) => {
                let mut values = Vec::with_capacity(items.len());
                let mut valid = true;
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(value) => values.push(value.clone()),
                        other => {
                            valid = false;
                            self.issue(
                                format!("{key}[{index}]"),
                                format!("expected a string, got {}", type_name(other)),
                            );
                        }
                    }
                }
                if valid { Field::Set(values) } else { Field::Unset }
            }
            Some(other) => {
                self.issue(key, format!("expected an array, got {}", type_name(other)));
                Field::Unset
            }
        }
    }

    /// Record a rule that spans the already-decoded value.
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.issue(key, message);
        }
    }

    pub fn finish(self) -> ToolResult<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ToolError::Validation(self.issues))
        }
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

/// Remove duplicate tags, keeping first-seen order.
pub fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}
