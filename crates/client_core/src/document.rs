use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::error::ValidationError;

const PDF_MIME_TYPE: &str = "application/pdf";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Study material selected or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("'{}' does not name a file", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read document '{}'", path.display()))?;
        Ok(Self::new(filename, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn upload_mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(PDF_MIME_TYPE)
    }

    fn is_pdf(&self) -> bool {
        let by_extension = Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let by_mime = self
            .mime_type
            .as_deref()
            .is_some_and(|mime| mime.eq_ignore_ascii_case(PDF_MIME_TYPE));
        by_extension || by_mime
    }
}

/// Client-side checks applied before a document is sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub require_pdf: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            require_pdf: true,
        }
    }
}

impl UploadPolicy {
    pub fn validate(&self, file: &DocumentFile) -> Result<(), ValidationError> {
        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                filename: file.filename.clone(),
            });
        }
        if self.require_pdf && !file.is_pdf() {
            return Err(ValidationError::UnsupportedFileType {
                filename: file.filename.clone(),
            });
        }
        if file.size() > self.max_bytes {
            return Err(ValidationError::FileTooLarge {
                filename: file.filename.clone(),
                size: file.size(),
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}
