use std::sync::Arc;

use crate::config::Config;
use crate::services::{ExtractionService, TextExtractor};

/// Process-wide, read-only dependencies handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extraction: ExtractionService,
}

impl AppState {
    pub fn new(config: Config, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            config: Arc::new(config),
            extraction: ExtractionService::new(extractor),
        }
    }
}
