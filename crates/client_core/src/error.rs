//! Error taxonomy for the tutoring workflow.
//!
//! Transport failures are split by operation: [`TransferError`] for the
//! document upload and [`RetrievalError`] for summary and chat requests.
//! [`ValidationError`] covers precondition violations that are rejected before
//! any state changes.

use thiserror::Error;

use crate::state::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("upload timed out")]
    TimedOut,
    #[error("upload failed: {0}")]
    Network(String),
    #[error("upload rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("could not build upload request: {0}")]
    InvalidRequest(String),
    #[error("unexpected upload response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("request timed out")]
    TimedOut,
    #[error("request failed: {0}")]
    Network(String),
    #[error("request rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("no document has been uploaded")]
    NoDocument,
    #[error("still waiting for the previous answer")]
    ReplyPending,
    #[error("operation not allowed while {stage:?}")]
    WrongStage { stage: Stage },
    #[error("another tutoring operation is still in flight")]
    Busy,
    #[error("{filename}: only PDF documents are accepted")]
    UnsupportedFileType { filename: String },
    #[error("{filename} is empty")]
    EmptyFile { filename: String },
    #[error("{filename} is {size} bytes; the upload limit is {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("tutoring worker is no longer running")]
    WorkerStopped,
    /// The operation's future was dropped before the request finished.
    #[error("request was abandoned before it completed")]
    Cancelled,
}

impl WorkflowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}
