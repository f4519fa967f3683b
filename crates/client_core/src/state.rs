use serde::Serialize;
use shared::domain::{DocumentId, Sender};

use crate::{
    conversation::ConversationLog,
    summary::{render_summary, SummaryBlock},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    Summary,
    Chat,
}

impl Stage {
    /// Stages in which a document identifier is guaranteed to be present.
    pub fn has_document(self) -> bool {
        matches!(self, Stage::Summary | Stage::Chat)
    }
}

/// Snapshot of the tutoring session that the view renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowState {
    pub stage: Stage,
    pub upload_progress: u8,
    pub document_id: Option<DocumentId>,
    pub summary_text: String,
    pub conversation: ConversationLog,
    pub pending_reply: bool,
}

impl WorkflowState {
    pub fn summary_blocks(&self) -> Vec<SummaryBlock> {
        render_summary(&self.summary_text)
    }

    /// Returns the first broken state invariant, if any.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.stage == Stage::Idle && self.document_id.is_some() {
            return Some("idle session holds a document id");
        }
        if self.stage == Stage::Idle && self.upload_progress != 0 {
            return Some("idle session reports upload progress");
        }
        if self.stage.has_document() && self.document_id.is_none() {
            return Some("summary or chat stage without a document id");
        }
        if self.upload_progress > 100 {
            return Some("upload progress above 100");
        }
        if self.pending_reply && self.conversation.last_sender() != Some(Sender::User) {
            return Some("pending reply without a trailing user message");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;

    #[test]
    fn initial_state_is_idle_and_consistent() {
        let state = WorkflowState::default();
        assert_eq!(state.stage, Stage::Idle);
        assert_eq!(state.upload_progress, 0);
        assert!(state.document_id.is_none());
        assert_eq!(state.invariant_violation(), None);
    }

    #[test]
    fn detects_pending_reply_after_assistant_message() {
        let mut state = WorkflowState {
            stage: Stage::Chat,
            document_id: Some(DocumentId::from("doc-1")),
            pending_reply: true,
            ..WorkflowState::default()
        };
        state.conversation.append(Message::assistant("hello"));
        assert!(state.invariant_violation().is_some());
    }

    #[test]
    fn detects_summary_stage_without_document() {
        let state = WorkflowState {
            stage: Stage::Summary,
            ..WorkflowState::default()
        };
        assert!(state.invariant_violation().is_some());
    }
}
