use std::sync::Arc;
use std::time::Instant;

use crate::error::AppResult;
use crate::models::UploadedDocument;
use crate::services::extractor::{TextExtractor, EXTRACTION_PROMPT};
use crate::services::text::normalize_whitespace;

/// Validates an upload, hands it to the model and normalizes what comes back.
#[derive(Clone)]
pub struct ExtractionService {
    extractor: Arc<dyn TextExtractor>,
}

impl ExtractionService {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn extract(&self, document: &UploadedDocument) -> AppResult<String> {
        document.validate()?;

        let start = Instant::now();
        tracing::info!(
            file_name = document.name.as_deref().unwrap_or("-"),
            file_size = document.size(),
            "Delegating extraction to model"
        );

        let raw = self
            .extractor
            .extract_text(document, EXTRACTION_PROMPT)
            .await?;

        let text = normalize_whitespace(&raw);

        tracing::info!(
            raw_length = raw.len(),
            text_length = text.len(),
            processing_time_ms = start.elapsed().as_millis() as u64,
            "Extraction completed"
        );

        Ok(text)
    }
}
