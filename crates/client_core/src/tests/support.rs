//! Scripted in-memory transfer client shared by controller and runtime tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::domain::DocumentId;
use tokio::sync::Semaphore;

use crate::{
    document::DocumentFile,
    error::{RetrievalError, TransferError},
    transfer::TransferClient,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Upload { filename: String },
    Summary { document_id: DocumentId, refine: bool },
    Ask { document_id: DocumentId, question: String },
}

#[derive(Default)]
pub(crate) struct ScriptedTransfer {
    uploads: Mutex<VecDeque<Result<DocumentId, TransferError>>>,
    summaries: Mutex<VecDeque<Result<String, RetrievalError>>>,
    answers: Mutex<VecDeque<Result<String, RetrievalError>>>,
    upload_gate: Option<Arc<Semaphore>>,
    ask_gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransfer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn upload_ok(self, document_id: &str) -> Self {
        self.push_upload(Ok(DocumentId::from(document_id)))
    }

    pub(crate) fn upload_err(self, err: TransferError) -> Self {
        self.push_upload(Err(err))
    }

    pub(crate) fn summary_ok(self, text: &str) -> Self {
        self.push_summary(Ok(text.to_string()))
    }

    pub(crate) fn summary_err(self, err: RetrievalError) -> Self {
        self.push_summary(Err(err))
    }

    pub(crate) fn answer_ok(self, text: &str) -> Self {
        self.push_answer(Ok(text.to_string()))
    }

    pub(crate) fn answer_err(self, err: RetrievalError) -> Self {
        self.push_answer(Err(err))
    }

    /// Uploads wait for a permit on `gate` before answering.
    pub(crate) fn gate_uploads(mut self, gate: Arc<Semaphore>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    /// Questions wait for a permit on `gate` before answering.
    pub(crate) fn gate_answers(mut self, gate: Arc<Semaphore>) -> Self {
        self.ask_gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    fn push_upload(self, result: Result<DocumentId, TransferError>) -> Self {
        self.uploads.lock().expect("uploads").push_back(result);
        self
    }

    fn push_summary(self, result: Result<String, RetrievalError>) -> Self {
        self.summaries.lock().expect("summaries").push_back(result);
        self
    }

    fn push_answer(self, result: Result<String, RetrievalError>) -> Self {
        self.answers.lock().expect("answers").push_back(result);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }
}

async fn pass_gate(gate: Option<&Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.expect("gate open").forget();
    }
}

#[async_trait]
impl TransferClient for ScriptedTransfer {
    async fn upload(&self, file: &DocumentFile) -> Result<DocumentId, TransferError> {
        self.record(Call::Upload {
            filename: file.filename.clone(),
        });
        pass_gate(self.upload_gate.as_ref()).await;
        let next = self.uploads.lock().expect("uploads").pop_front();
        next.unwrap_or_else(|| Err(TransferError::Network("no scripted upload".to_string())))
    }

    async fn get_summary(
        &self,
        document_id: &DocumentId,
        refine: bool,
    ) -> Result<String, RetrievalError> {
        self.record(Call::Summary {
            document_id: document_id.clone(),
            refine,
        });
        let next = self.summaries.lock().expect("summaries").pop_front();
        next.unwrap_or_else(|| Err(RetrievalError::Network("no scripted summary".to_string())))
    }

    async fn ask(
        &self,
        document_id: &DocumentId,
        question: &str,
    ) -> Result<String, RetrievalError> {
        self.record(Call::Ask {
            document_id: document_id.clone(),
            question: question.to_string(),
        });
        pass_gate(self.ask_gate.as_ref()).await;
        let next = self.answers.lock().expect("answers").pop_front();
        next.unwrap_or_else(|| Err(RetrievalError::Network("no scripted answer".to_string())))
    }
}

pub(crate) fn notes_pdf() -> DocumentFile {
    DocumentFile::new("notes.pdf", b"%PDF-1.7 lecture notes".to_vec())
}
