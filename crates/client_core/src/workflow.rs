//! Tutoring workflow controller.
//!
//! [`TutorWorkflow`] owns the [`WorkflowState`] and is its only writer apart
//! from the progress task, which may only raise `upload_progress` while the
//! stage is `Uploading`. Operations take `&mut self`, so at most one of them
//! is suspended on the network at any time. Views read state through
//! [`TutorWorkflow::subscribe`] and receive notices through
//! [`TutorWorkflow::subscribe_events`].
//!
//! Dropping an operation's future part way through is treated as a failure of
//! that operation: an abandoned upload resets the session, and an abandoned
//! question gets [`CONNECTION_PROBLEM_REPLY`].

use std::sync::Arc;

use shared::domain::DocumentId;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    conversation::Message,
    document::{DocumentFile, UploadPolicy},
    error::{ValidationError, WorkflowError},
    progress::{ProgressPlan, ProgressReporter, ProgressSink},
    state::{Stage, WorkflowState},
    transfer::TransferClient,
};

pub const UPLOAD_FAILED_NOTICE: &str = "Upload failed. Try again.";
pub const CONNECTION_PROBLEM_REPLY: &str = "Sorry, there was a connection problem.";

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    StageChanged { from: Stage, to: Stage },
    /// Blocking notice: the session is back to Idle and the user must resubmit.
    UploadFailed { message: String },
    RefineFailed { message: String },
    /// The question was answered with [`CONNECTION_PROBLEM_REPLY`].
    ReplyDegraded { reason: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowOptions {
    pub upload_policy: UploadPolicy,
    pub progress: ProgressPlan,
}

pub struct TutorWorkflow {
    session_id: Uuid,
    transfer: Arc<dyn TransferClient>,
    options: WorkflowOptions,
    state: Arc<watch::Sender<WorkflowState>>,
    events: broadcast::Sender<WorkflowEvent>,
}

/// Feeds simulated percentages into the shared state. Values that would lower
/// the current percentage, or that arrive outside the upload stage, are dropped.
struct UploadProgressSink {
    state: Arc<watch::Sender<WorkflowState>>,
}

impl ProgressSink for UploadProgressSink {
    fn raise(&self, percent: u8) {
        self.state.send_if_modified(|state| {
            if state.stage != Stage::Uploading || percent <= state.upload_progress {
                return false;
            }
            state.upload_progress = percent;
            true
        });
    }
}

/// Runs `on_cancel` if dropped while still armed. Held across the awaits of an
/// operation so that dropping its future leaves the state consistent.
struct CancelGuard<'a> {
    workflow: &'a TutorWorkflow,
    on_cancel: Option<fn(&TutorWorkflow)>,
}

impl<'a> CancelGuard<'a> {
    fn arm(workflow: &'a TutorWorkflow, on_cancel: fn(&TutorWorkflow)) -> Self {
        Self {
            workflow,
            on_cancel: Some(on_cancel),
        }
    }

    fn disarm(mut self) {
        self.on_cancel = None;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel(self.workflow);
        }
    }
}

impl TutorWorkflow {
    pub fn new(transfer: Arc<dyn TransferClient>) -> Self {
        Self::with_options(transfer, WorkflowOptions::default())
    }

    pub fn with_options(transfer: Arc<dyn TransferClient>, options: WorkflowOptions) -> Self {
        let (state, _) = watch::channel(WorkflowState::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session_id: Uuid::new_v4(),
            transfer,
            options,
            state: Arc::new(state),
            events,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<WorkflowEvent> {
        self.events.clone()
    }

    /// Uploads `file`, then fetches its first summary.
    ///
    /// Only valid from `Idle`. Any transfer or summary failure resets the
    /// session to its initial state and emits [`WorkflowEvent::UploadFailed`];
    /// nothing is retried.
    pub async fn submit_file(&mut self, file: DocumentFile) -> Result<(), WorkflowError> {
        let stage = self.state.borrow().stage;
        if stage != Stage::Idle {
            return Err(ValidationError::WrongStage { stage }.into());
        }
        self.options.upload_policy.validate(&file)?;

        info!(
            session_id = %self.session_id,
            filename = %file.filename,
            size_bytes = file.size(),
            "tutor: upload started"
        );
        self.transition(Stage::Uploading, |state| state.upload_progress = 0);

        // Declared before the reporter so the reporter is aborted first on drop.
        let guard = CancelGuard::arm(self, Self::abandon_upload);
        let reporter = ProgressReporter::start(
            self.options.progress,
            Arc::new(UploadProgressSink {
                state: Arc::clone(&self.state),
            }),
        );
        let document_id = match self.transfer.upload(&file).await {
            Ok(document_id) => {
                reporter.finish().await;
                document_id
            }
            Err(err) => {
                reporter.cancel().await;
                guard.disarm();
                return Err(self.fail_upload(err.into()));
            }
        };
        self.state
            .send_modify(|state| state.document_id = Some(document_id.clone()));

        let summary = self.transfer.get_summary(&document_id, false).await;
        guard.disarm();
        match summary {
            Ok(summary) => {
                info!(session_id = %self.session_id, %document_id, "tutor: summary ready");
                self.transition(Stage::Summary, |state| state.summary_text = summary);
                Ok(())
            }
            Err(err) => Err(self.fail_upload(err.into())),
        }
    }

    /// Replaces the summary with a refined one. The transcript and stage are
    /// left alone; on failure the previous summary is kept.
    pub async fn refine_summary(&mut self) -> Result<(), WorkflowError> {
        let document_id = self.require_document()?;

        match self.transfer.get_summary(&document_id, true).await {
            Ok(summary) => {
                info!(session_id = %self.session_id, %document_id, "tutor: summary refined");
                self.state.send_modify(|state| state.summary_text = summary);
                Ok(())
            }
            Err(err) => {
                warn!(session_id = %self.session_id, %document_id, error = %err, "tutor: refine failed");
                let _ = self.events.send(WorkflowEvent::RefineFailed {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Asks a question about the uploaded document.
    ///
    /// The question is appended to the transcript before the request is sent.
    /// Exactly one assistant message follows it: the answer, or
    /// [`CONNECTION_PROBLEM_REPLY`] if the request failed. Returns that
    /// assistant message.
    pub async fn send_message(&mut self, text: &str) -> Result<Message, WorkflowError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        if self.state.borrow().pending_reply {
            return Err(ValidationError::ReplyPending.into());
        }
        let document_id = self.require_document()?;

        self.state.send_modify(|state| {
            state.conversation.append(Message::user(question));
            state.pending_reply = true;
        });

        let guard = CancelGuard::arm(self, Self::abandon_reply);
        let answer = self.transfer.ask(&document_id, question).await;
        guard.disarm();
        let reply = match answer {
            Ok(answer) => Message::assistant(answer),
            Err(err) => {
                warn!(session_id = %self.session_id, %document_id, error = %err, "tutor: question failed");
                let _ = self.events.send(WorkflowEvent::ReplyDegraded {
                    reason: err.to_string(),
                });
                Message::assistant(CONNECTION_PROBLEM_REPLY)
            }
        };

        let appended = reply.clone();
        self.transition(Stage::Chat, move |state| {
            state.conversation.append(appended);
            state.pending_reply = false;
        });
        Ok(reply)
    }

    fn require_document(&self) -> Result<DocumentId, ValidationError> {
        let state = self.state.borrow();
        if !state.stage.has_document() {
            return Err(ValidationError::WrongStage { stage: state.stage });
        }
        state.document_id.clone().ok_or(ValidationError::NoDocument)
    }

    fn abandon_upload(&self) {
        let _ = self.fail_upload(WorkflowError::Cancelled);
    }

    /// Closes out a question whose request was dropped, as if it had failed.
    fn abandon_reply(&self) {
        warn!(session_id = %self.session_id, "tutor: question abandoned before its reply");
        let _ = self.events.send(WorkflowEvent::ReplyDegraded {
            reason: WorkflowError::Cancelled.to_string(),
        });
        self.transition(Stage::Chat, |state| {
            state
                .conversation
                .append(Message::assistant(CONNECTION_PROBLEM_REPLY));
            state.pending_reply = false;
        });
    }

    fn fail_upload(&self, err: WorkflowError) -> WorkflowError {
        warn!(session_id = %self.session_id, error = %err, "tutor: upload failed");
        let previous = self.state.send_replace(WorkflowState::default());
        let _ = self.events.send(WorkflowEvent::StageChanged {
            from: previous.stage,
            to: Stage::Idle,
        });
        let _ = self.events.send(WorkflowEvent::UploadFailed {
            message: format!("{UPLOAD_FAILED_NOTICE} ({err})"),
        });
        err
    }

    /// Applies `update` and moves to `to` in a single state publication.
    fn transition(&self, to: Stage, update: impl FnOnce(&mut WorkflowState)) {
        let mut from = to;
        self.state.send_modify(|state| {
            from = state.stage;
            update(state);
            state.stage = to;
        });
        if let Some(violation) = self.state.borrow().invariant_violation() {
            error!(session_id = %self.session_id, ?to, violation, "tutor: inconsistent state");
        }
        if from != to {
            info!(session_id = %self.session_id, ?from, ?to, "tutor: stage changed");
            let _ = self.events.send(WorkflowEvent::StageChanged { from, to });
        }
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
