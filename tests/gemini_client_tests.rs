//! GeminiClient against a local stand-in for the generateContent endpoint

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, Uri},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use lector::models::UploadedDocument;
use lector::services::{ExtractorError, GeminiClient, TextExtractor, EXTRACTION_PROMPT};
use lector::{create_router, AppState, Config};

const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n%%EOF";

#[derive(Default)]
struct Captured {
    path: Option<String>,
    api_key: Option<String>,
    body: Option<Value>,
}

async fn start_mock_gemini_server(
    status: u16,
    response_body: &'static str,
) -> (String, Arc<Mutex<Captured>>, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://127.0.0.1:{}", addr.port());

    let captured = Arc::new(Mutex::new(Captured::default()));
    let sink = captured.clone();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        let route = post(move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                {
                    let mut captured = sink.lock().unwrap();
                    captured.path = Some(uri.path().to_string());
                    captured.api_key = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.body = Some(body);
                }
                (
                    StatusCode::from_u16(status).unwrap(),
                    [("content-type", "application/json")],
                    response_body,
                )
                    .into_response()
            }
        });

        let app = Router::new().route("/v1beta/models/*rest", route);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (base_url, captured, shutdown_tx)
}

fn pdf_document() -> UploadedDocument {
    UploadedDocument::new("application/pdf", Bytes::from_static(SAMPLE_PDF))
}

#[tokio::test]
async fn sends_inline_pdf_and_prompt_then_joins_text_parts() {
    let response_body = r#"{
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Lecture 1\n\n"}, {"text": "Sorting  algorithms"}]},
            "finishReason": "STOP"
        }]
    }"#;
    let (base_url, captured, shutdown_tx) = start_mock_gemini_server(200, response_body).await;

    let client = GeminiClient::new(&base_url, "models/gemini-test", "secret-key", None).unwrap();
    let text = client
        .extract_text(&pdf_document(), EXTRACTION_PROMPT)
        .await
        .unwrap();

    assert_eq!(text, "Lecture 1\n\nSorting  algorithms");

    let captured = captured.lock().unwrap();
    assert_eq!(
        captured.path.as_deref(),
        Some("/v1beta/models/gemini-test:generateContent")
    );
    assert_eq!(captured.api_key.as_deref(), Some("secret-key"));

    let parts = &captured.body.as_ref().unwrap()["contents"][0]["parts"];
    assert_eq!(parts[0]["inline_data"]["mime_type"], "application/pdf");
    assert_eq!(
        parts[0]["inline_data"]["data"],
        general_purpose::STANDARD.encode(SAMPLE_PDF)
    );
    assert_eq!(parts[1]["text"], EXTRACTION_PROMPT);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn api_error_body_is_reported() {
    let response_body = r#"{
        "error": {"code": 429, "message": "Quota exceeded for metric generate_content", "status": "RESOURCE_EXHAUSTED"}
    }"#;
    let (base_url, _captured, shutdown_tx) = start_mock_gemini_server(429, response_body).await;

    let client = GeminiClient::new(&base_url, "gemini-test", "secret-key", None).unwrap();
    let result = client.extract_text(&pdf_document(), EXTRACTION_PROMPT).await;

    match result {
        Err(ExtractorError::Api { code, status, message }) => {
            assert_eq!(code, 429);
            assert_eq!(status, "RESOURCE_EXHAUSTED");
            assert!(message.contains("Quota exceeded"));
        }
        other => panic!("expected Api error, got: {:?}", other),
    }

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn blocked_prompt_is_no_text() {
    let response_body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
    let (base_url, _captured, shutdown_tx) = start_mock_gemini_server(200, response_body).await;

    let client = GeminiClient::new(&base_url, "gemini-test", "secret-key", None).unwrap();
    let err = client
        .extract_text(&pdf_document(), EXTRACTION_PROMPT)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractorError::NoText(Some(_))));
    assert!(err.to_string().contains("SAFETY"));

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let (base_url, _captured, shutdown_tx) = start_mock_gemini_server(200, "not json").await;

    let client = GeminiClient::new(&base_url, "gemini-test", "secret-key", None).unwrap();
    let result = client.extract_text(&pdf_document(), EXTRACTION_PROMPT).await;

    assert!(matches!(result, Err(ExtractorError::Decode(_))), "got: {:?}", result);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn unreachable_endpoint_is_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = GeminiClient::new(&format!("http://127.0.0.1:{port}"), "gemini-test", "k", None).unwrap();
    let result = client.extract_text(&pdf_document(), EXTRACTION_PROMPT).await;

    assert!(matches!(result, Err(ExtractorError::Request(_))), "got: {:?}", result);
}

#[tokio::test]
async fn upstream_failure_reaches_caller_as_bad_gateway() {
    let response_body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
    let (base_url, _captured, shutdown_tx) = start_mock_gemini_server(403, response_body).await;

    let config = Config::from_lookup(|name| match name {
        "GEMINI_API_KEY" => Some("bad-key".to_string()),
        "GEMINI_BASE_URL" => Some(base_url.clone()),
        "UPSTREAM_TIMEOUT_SECONDS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    let client = GeminiClient::from_config(&config).unwrap();
    let app = create_router(AppState::new(config, Arc::new(client)));

    let boundary = "gemini-e2e";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(SAMPLE_PDF);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/extract")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("API key not valid"));

    let _ = shutdown_tx.send(());
}
