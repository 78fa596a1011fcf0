use async_trait::async_trait;
use thiserror::Error;

use crate::models::UploadedDocument;

/// Instruction sent alongside every document.
pub const EXTRACTION_PROMPT: &str = "Extract the full readable text from this PDF. \
Exclude footer text. \
Return clean plain text only.";

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("{status} ({code}): {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("no text returned{}", .0.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    NoText(Option<String>),
}

/// The external document-understanding model.
///
/// Implementations receive the validated document and the instruction text
/// and return the raw generated text, unnormalized.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(
        &self,
        document: &UploadedDocument,
        prompt: &str,
    ) -> Result<String, ExtractorError>;
}
