use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::UploadedDocument;
use crate::services::extractor::{ExtractorError, TextExtractor};

/// Gemini `generateContent` client.
///
/// One instance is built at startup and shared by every request; it holds no
/// mutable state.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.gemini_base_url,
            &config.gemini_model,
            &config.gemini_api_key,
            config.upstream_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    InlineData { inline_data: Blob<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct Blob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, ExtractorError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .map(|reason| format!("prompt blocked: {reason}"));
            return Err(ExtractorError::NoText(reason));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .map(|reason| format!("finish reason: {reason}"));
            return Err(ExtractorError::NoText(reason));
        }

        Ok(text)
    }
}

fn api_error(status: reqwest::StatusCode, body: &str) -> ExtractorError {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => ExtractorError::Api {
            code: if envelope.error.code == 0 {
                status.as_u16()
            } else {
                envelope.error.code
            },
            status: if envelope.error.status.is_empty() {
                status.to_string()
            } else {
                envelope.error.status
            },
            message: envelope.error.message,
        },
        Err(_) => ExtractorError::Api {
            code: status.as_u16(),
            status: status.to_string(),
            message: body.trim().to_string(),
        },
    }
}

#[async_trait]
impl TextExtractor for GeminiClient {
    #[tracing::instrument(
        skip(self, document, prompt),
        fields(model = %self.model, file_size = document.size())
    )]
    async fn extract_text(
        &self,
        document: &UploadedDocument,
        prompt: &str,
    ) -> Result<String, ExtractorError> {
        let start = Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: Blob {
                            mime_type: &document.mime_type,
                            data: general_purpose::STANDARD.encode(&document.content),
                        },
                    },
                    RequestPart::Text { text: prompt },
                ],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractorError::Request(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ExtractorError::Request(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Gemini returned an error status");
            return Err(api_error(status, &raw));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(raw_response = %raw, "Failed to parse Gemini JSON");
            ExtractorError::Decode(e.to_string())
        })?;

        let text = parsed.into_text()?;

        tracing::debug!(
            text_length = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Gemini extraction returned"
        );

        Ok(text)
    }
}
