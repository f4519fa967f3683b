use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the tutoring service on non-2xx responses.
///
/// `detail` is usually a string, but request validation failures carry a
/// list of field errors instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: Value,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Value::String(detail.into()),
        }
    }

    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}
