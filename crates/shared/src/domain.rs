use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier the tutoring service assigns to an uploaded document.
///
/// The service may hand back either a JSON string or a JSON integer; the
/// original representation is preserved so it round-trips unchanged in later
/// summary and chat requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(RawDocumentId);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDocumentId {
    Number(i64),
    Text(String),
}

impl DocumentId {
    pub fn is_blank(&self) -> bool {
        match &self.0 {
            RawDocumentId::Number(_) => false,
            RawDocumentId::Text(text) => text.trim().is_empty(),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            RawDocumentId::Number(id) => write!(f, "{id}"),
            RawDocumentId::Text(id) => f.write_str(id),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(RawDocumentId::Text(value.to_string()))
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(RawDocumentId::Text(value))
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        Self(RawDocumentId::Number(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}
