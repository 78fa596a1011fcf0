use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::middleware::REQUEST_ID_HEADER;
use crate::models::{ExtractResponse, UploadedDocument, PDF_MIME_TYPE};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

pub async fn extract_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ExtractResponse>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    info!(request_id = %request_id, "Starting PDF extraction request");

    let mut multipart = multipart.map_err(|e| AppError::unreadable(e.body_text()))?;
    let document = read_file_field(&mut multipart, state.config.max_file_size_mb).await?;

    info!(
        request_id = %request_id,
        file_name = document.name.as_deref().unwrap_or("-"),
        file_size = document.size(),
        "File extracted from multipart form"
    );

    run_extraction(&state, document, &request_id, start).await
}

/// Finds the `file` field and reads it, checking the declared type first so
/// a rejected upload is never buffered.
async fn read_file_field(multipart: &mut Multipart, limit_mb: usize) -> AppResult<UploadedDocument> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, limit_mb))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field_name = ?field.name(), "Skipping multipart field");
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        UploadedDocument::ensure_pdf(content_type.as_deref())?;

        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(|e| read_error(e, limit_mb))?;

        let mut document = UploadedDocument::new(PDF_MIME_TYPE, data);
        if let Some(name) = file_name {
            document = document.with_name(name);
        }
        return Ok(document);
    }

    Err(AppError::MissingFile)
}

fn read_error(err: MultipartError, limit_mb: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge { limit_mb }
    } else {
        AppError::unreadable(err.body_text())
    }
}

// Alternative handler for direct binary upload
pub async fn extract_binary_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<ExtractResponse>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    info!(request_id = %request_id, "Starting binary PDF extraction request");

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok());
    UploadedDocument::ensure_pdf(content_type)?;

    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge {
                limit_mb: state.config.max_file_size_mb,
            }
        } else {
            AppError::unreadable(e.body_text())
        }
    })?;

    info!(request_id = %request_id, file_size = body.len(), "Processing binary PDF");

    run_extraction(&state, UploadedDocument::new(PDF_MIME_TYPE, body), &request_id, start).await
}

async fn run_extraction(
    state: &AppState,
    document: UploadedDocument,
    request_id: &str,
    start: Instant,
) -> AppResult<Json<ExtractResponse>> {
    let text = match state.extraction.extract(&document).await {
        Ok(text) => text,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "PDF extraction failed");
            return Err(e);
        }
    };

    info!(
        request_id = %request_id,
        text_length = text.len(),
        total_time_ms = start.elapsed().as_millis() as u64,
        "Request completed successfully"
    );

    Ok(Json(ExtractResponse::success(text)))
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()[..8].to_string())
}
