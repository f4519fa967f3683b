//! Client core for the document tutor: upload a study document, read its
//! summary, and ask questions about it.
//!
//! The [`workflow::TutorWorkflow`] controller owns all session state and talks
//! to the tutoring service through a [`transfer::TransferClient`]. Views either
//! drive the controller directly or go through the command queue in
//! [`runtime`].

pub mod conversation;
pub mod document;
pub mod error;
pub mod progress;
pub mod runtime;
pub mod scroll_lock;
pub mod session;
pub mod state;
pub mod summary;
pub mod transfer;
pub mod workflow;

pub use conversation::{ConversationLog, Message};
pub use document::{DocumentFile, UploadPolicy};
pub use error::{RetrievalError, TransferError, ValidationError, WorkflowError};
pub use progress::ProgressPlan;
pub use runtime::{spawn_workflow, WorkflowHandle};
pub use session::{AnonymousSession, SessionProvider, StaticSession};
pub use state::{Stage, WorkflowState};
pub use summary::{render_summary, SummaryBlock};
pub use transfer::{HttpTransferClient, HttpTransferConfig, TransferClient};
pub use workflow::{
    TutorWorkflow, WorkflowEvent, WorkflowOptions, CONNECTION_PROBLEM_REPLY, UPLOAD_FAILED_NOTICE,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
