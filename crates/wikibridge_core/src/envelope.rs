use serde_json::{Map, Value, json};

use crate::error::ToolError;

/// Uniform tool response: `{success: true, ...}` or `{success: false, error, tool, ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    success: bool,
    body: Map<String, Value>,
}

impl Envelope {
    /// Wrap an operation payload. A non-object payload lands under `result`.
    pub fn success(payload: Value) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        match payload {
            Value::Object(fields) => {
                for (key, value) in fields {
                    if key != "success" {
                        body.insert(key, value);
                    }
                }
            }
            Value::Null => {}
            other => {
                body.insert("result".to_string(), other);
            }
        }
        Self {
            success: true,
            body,
        }
    }

    pub fn failure(tool: &str, error: &ToolError) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(error.to_string()));
        body.insert("tool".to_string(), Value::String(tool.to_string()));
        body.insert("kind".to_string(), Value::String(error.kind().to_string()));
        if let ToolError::Validation(issues) = error {
            body.insert("issues".to_string(), json!(issues));
        }
        Self {
            success: false,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }

    /// Pretty JSON for text content blocks.
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.to_value().to_string())
    }
}
