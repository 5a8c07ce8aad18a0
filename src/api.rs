//! Generative-text backend used for translation.
//!
//! This module provides the interface to the Google Gemini
//! `generateContent` REST endpoint.
//!
//! # Architecture
//!
//! - [`TranslationBackend`]: Core trait; one prompt in, generated text out
//! - [`GeminiClient`]: `reqwest` implementation against the Gemini API
//! - [`TranslateError`]: Classified failure, so callers can log precisely
//!   and decide on a fallback
//!
//! Calls are not retried. A failed call is reported once and the caller
//! keeps the source text.

use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Base URL of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Classified backend failure.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP 429 / `RESOURCE_EXHAUSTED`.
    #[error("quota exhausted: {0}")]
    QuotaExceeded(String),
    /// The request or its content was refused (invalid argument, safety block).
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The configured model does not exist or is not available to this key.
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("credential refused: {0}")]
    Unauthorized(String),
    #[error("backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// A 2xx answer that carried no text.
    #[error("backend returned no text")]
    EmptyResponse,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A text-generation backend.
///
/// Implementors take a complete prompt and return the generated text.
/// The [`Translator`](crate::translate::Translator) owns prompt wording and
/// the fallback policy; a backend only reports what happened.
pub trait TranslationBackend {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, TranslateError>;
}

/// Gemini `generateContent` client.
///
/// Constructed once at startup from the API key and passed into the
/// translator; nothing here is global.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client for `model` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_key,
            model,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{GEMINI_API_BASE}/models/{}:generateContent",
            urlencoding::encode(&self.model)
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a non-2xx Gemini answer to a [`TranslateError`].
fn classify_error(status: StatusCode, body: &str) -> TranslateError {
    let (api_status, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.status, env.error.message),
        Err(_) => (String::new(), truncate_for_log(body, 300)),
    };

    match (status, api_status.as_str()) {
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "RESOURCE_EXHAUSTED") => {
            TranslateError::QuotaExceeded(message)
        }
        (StatusCode::NOT_FOUND, _) | (_, "NOT_FOUND") => TranslateError::ModelNotFound(message),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => TranslateError::Unauthorized(message),
        (StatusCode::BAD_REQUEST, _) | (_, "INVALID_ARGUMENT" | "FAILED_PRECONDITION") => {
            TranslateError::Rejected(message)
        }
        _ => TranslateError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull the generated text out of a successful answer.
fn extract_text(response: GenerateResponse) -> Result<String, TranslateError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(TranslateError::Rejected(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(TranslateError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => Err(
                TranslateError::Rejected(format!("candidate blocked: {reason}")),
            ),
            _ => Err(TranslateError::EmptyResponse),
        };
    }
    Ok(text)
}

impl TranslationBackend for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, TranslateError> {
        let t0 = Instant::now();
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            let err = classify_error(status, &body);
            warn!(elapsed_ms, status = status.as_u16(), error = %err, "Gemini call failed");
            return Err(err);
        }

        let text = extract_text(serde_json::from_str(&body)?)?;
        debug!(elapsed_ms, bytes = text.len(), "Gemini call succeeded");
        Ok(text)
    }
}
