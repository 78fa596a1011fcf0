use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::models::UploadedDocument;
use crate::services::extractor::{ExtractorError, TextExtractor};

enum Reply {
    Text(String),
    Failure(String),
}

/// Deterministic stand-in for the external model.
pub struct MockTextExtractor {
    reply: Reply,
    calls: AtomicUsize,
}

impl MockTextExtractor {
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Failure(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    async fn extract_text(
        &self,
        _document: &UploadedDocument,
        _prompt: &str,
    ) -> Result<String, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Failure(message) => Err(ExtractorError::Api {
                code: 429,
                status: "RESOURCE_EXHAUSTED".to_string(),
                message: message.clone(),
            }),
        }
    }
}
