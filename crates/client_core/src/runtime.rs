//! Command queue between a view and the worker task that owns the workflow.
//!
//! The view keeps a cloneable [`WorkflowHandle`]; every operation becomes a
//! [`WorkflowCommand`] processed in order by a single worker. Only one command
//! may be in flight: a second dispatch while the first is still running is
//! rejected with [`ValidationError::Busy`] rather than queued behind it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::{
    sync::{
        broadcast,
        mpsc::{self, error::TrySendError},
        oneshot, watch,
    },
    task::JoinHandle,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
    conversation::Message,
    document::DocumentFile,
    error::{ValidationError, WorkflowError},
    state::WorkflowState,
    workflow::{TutorWorkflow, WorkflowEvent},
};

const COMMAND_QUEUE_CAPACITY: usize = 8;

type Reply<T> = oneshot::Sender<Result<T, WorkflowError>>;

pub enum WorkflowCommand {
    SubmitFile { file: DocumentFile, reply: Reply<()> },
    RefineSummary { reply: Reply<()> },
    SendMessage { text: String, reply: Reply<Message> },
}

impl WorkflowCommand {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowCommand::SubmitFile { .. } => "submit_file",
            WorkflowCommand::RefineSummary { .. } => "refine_summary",
            WorkflowCommand::SendMessage { .. } => "send_message",
        }
    }
}

#[derive(Clone)]
pub struct WorkflowHandle {
    session_id: Uuid,
    commands: mpsc::Sender<WorkflowCommand>,
    in_flight: Arc<AtomicBool>,
    state: watch::Receiver<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

/// Moves `workflow` onto a worker task and returns the handle used to drive it.
pub fn spawn_workflow(workflow: TutorWorkflow) -> (WorkflowHandle, JoinHandle<()>) {
    let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let in_flight = Arc::new(AtomicBool::new(false));
    let handle = WorkflowHandle {
        session_id: workflow.session_id(),
        commands,
        in_flight: Arc::clone(&in_flight),
        state: workflow.subscribe(),
        events: workflow.event_sender(),
    };
    let worker = tokio::spawn(run_worker(workflow, command_rx, in_flight));
    (handle, worker)
}

async fn run_worker(
    mut workflow: TutorWorkflow,
    mut commands: mpsc::Receiver<WorkflowCommand>,
    in_flight: Arc<AtomicBool>,
) {
    while let Some(cmd) = commands.recv().await {
        let cmd_name = cmd.name();
        debug!(session_id = %workflow.session_id(), command = cmd_name, "tutor: processing command");
        // In-flight must be cleared before replying; callers may dispatch again
        // as soon as they observe the outcome.
        match cmd {
            WorkflowCommand::SubmitFile { file, reply } => {
                let outcome = workflow.submit_file(file).await;
                in_flight.store(false, Ordering::Release);
                let _ = reply.send(outcome);
            }
            WorkflowCommand::RefineSummary { reply } => {
                let outcome = workflow.refine_summary().await;
                in_flight.store(false, Ordering::Release);
                let _ = reply.send(outcome);
            }
            WorkflowCommand::SendMessage { text, reply } => {
                let outcome = workflow.send_message(&text).await;
                in_flight.store(false, Ordering::Release);
                let _ = reply.send(outcome);
            }
        }
    }
    debug!(session_id = %workflow.session_id(), "tutor: command queue closed");
}

impl WorkflowHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<WorkflowState> {
        self.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit_file(&self, file: DocumentFile) -> Result<(), WorkflowError> {
        self.dispatch(|reply| WorkflowCommand::SubmitFile { file, reply })
            .await
    }

    pub async fn refine_summary(&self) -> Result<(), WorkflowError> {
        self.dispatch(|reply| WorkflowCommand::RefineSummary { reply })
            .await
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<Message, WorkflowError> {
        let text = text.into();
        self.dispatch(|reply| WorkflowCommand::SendMessage { text, reply })
            .await
    }

    async fn dispatch<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> WorkflowCommand,
    ) -> Result<T, WorkflowError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            if self.commands.is_closed() {
                return Err(WorkflowError::WorkerStopped);
            }
            return Err(ValidationError::Busy.into());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = build(reply_tx);
        let cmd_name = cmd.name();
        match self.commands.try_send(cmd) {
            Ok(()) => debug!(command = cmd_name, "tutor: queued command"),
            Err(TrySendError::Full(_)) => {
                self.in_flight.store(false, Ordering::Release);
                warn!(command = cmd_name, "tutor: command queue is full");
                return Err(ValidationError::Busy.into());
            }
            Err(TrySendError::Closed(_)) => {
                self.in_flight.store(false, Ordering::Release);
                error!(command = cmd_name, "tutor: command queue disconnected");
                return Err(WorkflowError::WorkerStopped);
            }
        }

        reply_rx.await.map_err(|_| WorkflowError::WorkerStopped)?
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
