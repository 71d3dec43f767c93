use serde::{Deserialize, Serialize};
use serde_json::Value;

// Common fields that may appear in any API response. Typed loosely so an
// endpoint's own `status`/`error` shapes never break envelope detection.
#[derive(Debug, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl StatusResponse {
    pub fn is_error(&self) -> bool {
        matches!(&self.status, Some(Value::String(s)) if s == "error")
    }

    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Body of the key validation endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Validation {
    #[serde(rename = "valid", default)]
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}
