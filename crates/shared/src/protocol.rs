use serde::{Deserialize, Serialize};

use crate::domain::DocumentId;

/// Reply text used when the service answers a chat request with neither an
/// answer nor an error.
pub const UNANSWERED_REPLY: &str = "Sorry, I could not answer that.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub doc_id: DocumentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub doc_id: DocumentId,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AskResponse {
    /// Text shown to the user: the answer when present, otherwise the
    /// application-level error string, otherwise a canned apology.
    pub fn into_reply_text(self) -> String {
        self.answer
            .filter(|answer| !answer.is_empty())
            .or(self.error.filter(|error| !error.is_empty()))
            .unwrap_or_else(|| UNANSWERED_REPLY.to_string())
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
