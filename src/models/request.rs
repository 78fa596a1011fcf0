use bytes::Bytes;

use crate::error::{AppError, AppResult};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A single upload as received from the client. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: Option<String>,
    pub mime_type: String,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn new(mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: None,
            mime_type: mime_type.into(),
            content,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Rejects anything but an exact `application/pdf` declaration.
    pub fn ensure_pdf(declared: Option<&str>) -> AppResult<()> {
        match declared {
            Some(PDF_MIME_TYPE) => Ok(()),
            other => Err(AppError::unsupported_media_type(other)),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        Self::ensure_pdf(Some(self.mime_type.as_str()))?;
        if self.content.is_empty() {
            return Err(AppError::EmptyUpload);
        }
        Ok(())
    }
}
