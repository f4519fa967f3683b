//! Network side of the tutoring workflow.
//!
//! [`TransferClient`] is the seam the workflow controller talks through;
//! [`HttpTransferClient`] implements it against the tutoring service's HTTP
//! API. No retries or backoff happen here: every failure is reported to the
//! caller as-is.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use shared::{
    domain::DocumentId,
    error::ApiError,
    protocol::{AskRequest, AskResponse, SummaryResponse, UploadResponse},
};
use tracing::{debug, info};
use url::Url;

use crate::{
    document::DocumentFile,
    error::{RetrievalError, TransferError},
    session::SessionProvider,
};

#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn upload(&self, file: &DocumentFile) -> Result<DocumentId, TransferError>;
    async fn get_summary(
        &self,
        document_id: &DocumentId,
        refine: bool,
    ) -> Result<String, RetrievalError>;
    async fn ask(&self, document_id: &DocumentId, question: &str)
        -> Result<String, RetrievalError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransferConfig {
    pub server_url: String,
    pub api_prefix: String,
    /// Per-request deadline; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl HttpTransferConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_prefix: "/api".to_string(),
            request_timeout: None,
        }
    }
}

pub struct HttpTransferClient {
    http: Client,
    api_base: String,
    session: Arc<dyn SessionProvider>,
}

/// Non-2xx response, with the server's `detail` text when it sent one.
struct Rejection {
    status: u16,
    message: String,
}

impl HttpTransferClient {
    pub fn new(config: HttpTransferConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
        let server_url = Url::parse(config.server_url.trim())
            .with_context(|| format!("invalid tutoring server url '{}'", config.server_url))?;
        let prefix = config.api_prefix.trim().trim_matches('/');
        let server = server_url.as_str().trim_end_matches('/');
        let api_base = if prefix.is_empty() {
            server.to_string()
        } else {
            format!("{server}/{prefix}")
        };

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build tutoring http client")?;

        Ok(Self {
            http,
            api_base,
            session,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl TransferClient for HttpTransferClient {
    async fn upload(&self, file: &DocumentFile) -> Result<DocumentId, TransferError> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(file.upload_mime_type())
            .map_err(|err| TransferError::InvalidRequest(err.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        debug!(filename = %file.filename, size_bytes = file.size(), "tutor: posting document");
        let response = self
            .authorized(self.http.post(self.endpoint("upload")))
            .multipart(form)
            .send()
            .await
            .map_err(upload_failure)?;
        let response = accept_success(response)
            .await
            .map_err(|rejection| TransferError::Rejected {
                status: rejection.status,
                message: rejection.message,
            })?;
        let body: UploadResponse = response.json().await.map_err(upload_failure)?;
        if body.doc_id.is_blank() {
            return Err(TransferError::MalformedResponse(
                "server returned an empty document id".to_string(),
            ));
        }

        info!(filename = %file.filename, document_id = %body.doc_id, "tutor: document stored");
        Ok(body.doc_id)
    }

    async fn get_summary(
        &self,
        document_id: &DocumentId,
        refine: bool,
    ) -> Result<String, RetrievalError> {
        let mut query = vec![("docId", document_id.to_string())];
        if refine {
            query.push(("refine", "1".to_string()));
        }

        let response = self
            .authorized(self.http.get(self.endpoint("summary")))
            .query(&query)
            .send()
            .await
            .map_err(retrieval_failure)?;
        let response = accept_success(response).await.map_err(rejected_retrieval)?;
        let body: SummaryResponse = response.json().await.map_err(retrieval_failure)?;

        debug!(%document_id, refine, chars = body.summary.len(), "tutor: summary received");
        Ok(body.summary)
    }

    async fn ask(
        &self,
        document_id: &DocumentId,
        question: &str,
    ) -> Result<String, RetrievalError> {
        let response = self
            .authorized(self.http.post(self.endpoint("chat")))
            .json(&AskRequest {
                doc_id: document_id.clone(),
                message: question.to_string(),
            })
            .send()
            .await
            .map_err(retrieval_failure)?;
        let response = accept_success(response).await.map_err(rejected_retrieval)?;
        let body: AskResponse = response.json().await.map_err(retrieval_failure)?;

        Ok(body.into_reply_text())
    }
}

async fn accept_success(response: Response) -> std::result::Result<Response, Rejection> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&raw) {
        Ok(body) => body.message(),
        Err(_) if !raw.trim().is_empty() => raw.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(Rejection {
        status: status.as_u16(),
        message,
    })
}

fn upload_failure(err: reqwest::Error) -> TransferError {
    if err.is_timeout() {
        TransferError::TimedOut
    } else if err.is_decode() {
        TransferError::MalformedResponse(err.to_string())
    } else {
        TransferError::Network(err.to_string())
    }
}

fn retrieval_failure(err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() {
        RetrievalError::TimedOut
    } else if err.is_decode() {
        RetrievalError::MalformedResponse(err.to_string())
    } else {
        RetrievalError::Network(err.to_string())
    }
}

fn rejected_retrieval(rejection: Rejection) -> RetrievalError {
    RetrievalError::Rejected {
        status: rejection.status,
        message: rejection.message,
    }
}

#[cfg(test)]
#[path = "tests/transfer_tests.rs"]
mod tests;
