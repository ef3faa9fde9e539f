//! Client for the external text-generation collaborator.
//!
//! Both the scoring adapter and the insight extractor talk to the same
//! model endpoint; they only differ in the prompt they send. The trait
//! keeps the pipeline testable without network access.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ModelError {
    /// The model endpoint rejected the request or the transport failed.
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status from the model endpoint.
    #[error("model returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not carry any generated text.
    #[error("model response had no text content")]
    EmptyResponse,

    /// Required configuration is missing.
    #[error("model not configured: {0}")]
    NotConfigured(String),
}

/// A collaborator that turns a prompt into free-form text.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Google Generative Language API client (`generateContent`).
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Build a client from `GEMINI_API_KEY` and optional `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ModelError::NotConfigured("set GEMINI_API_KEY env var".into()))?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(DEFAULT_BASE_URL, model, api_key))
    }

    fn generate_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!(
            "{base}/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "sending generate request");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(self.generate_url())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}
