use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::{ErrorDetail, ExtractResponse};
use crate::services::ExtractorError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Only PDF files are accepted")]
    UnsupportedMediaType { declared: Option<String> },

    #[error("Failed to read uploaded file")]
    UnreadableUpload { reason: String },

    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("No PDF file provided")]
    MissingFile,

    #[error("File exceeds the {limit_mb} MB limit")]
    FileTooLarge { limit_mb: usize },

    #[error("Gemini error: {message}")]
    UpstreamExtraction { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            AppError::UnreadableUpload { .. } => "UNREADABLE_UPLOAD",
            AppError::EmptyUpload => "EMPTY_UPLOAD",
            AppError::MissingFile => "MISSING_FILE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::UpstreamExtraction { .. } => "UPSTREAM_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedMediaType { .. }
            | AppError::UnreadableUpload { .. }
            | AppError::EmptyUpload
            | AppError::MissingFile
            | AppError::FileTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::UpstreamExtraction { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::UpstreamExtraction { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if self.is_upstream() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                error_message = %message,
                "Upstream extraction failed"
            );
            return (status, Json(ExtractResponse::failure(message))).into_response();
        }

        match &self {
            AppError::UnsupportedMediaType { declared } => tracing::warn!(
                error_code = error_code,
                declared_type = ?declared,
                "Rejected upload"
            ),
            AppError::UnreadableUpload { reason } => tracing::warn!(
                error_code = error_code,
                reason = %reason,
                "Rejected upload"
            ),
            _ => tracing::warn!(
                error_code = error_code,
                error_message = %message,
                "Rejected upload"
            ),
        }

        (status, Json(ErrorDetail::new(message))).into_response()
    }
}

// Every collaborator failure lands in the same 502 classification.
impl From<ExtractorError> for AppError {
    fn from(err: ExtractorError) -> Self {
        AppError::UpstreamExtraction {
            message: err.to_string(),
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn unsupported_media_type(declared: Option<&str>) -> Self {
        AppError::UnsupportedMediaType {
            declared: declared.map(str::to_string),
        }
    }

    pub fn unreadable(reason: impl Into<String>) -> Self {
        AppError::UnreadableUpload {
            reason: reason.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::UpstreamExtraction {
            message: message.into(),
        }
    }
}
