/// LLM Client — the single point of entry for all generative-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Everything goes through a `TextGenerator`, which `GeminiClient` implements
/// and tests replace with a scripted double.
///
/// Credentials, model and default knobs arrive via `GeminiConfig` at
/// construction; nothing is read from the process environment here.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
pub mod session;

pub use session::ChatSession;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("Gemini rejected the API key: {0}")]
    InvalidApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt was blocked by the generation service: {reason}")]
    Blocked { reason: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Network failures, rate limits and server errors. Only these are retried.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Message shown to the end user. Credential problems are called out so an
    /// operator knows where to look; everything else stays generic.
    pub fn user_message(&self) -> String {
        match self {
            LlmError::MissingApiKey | LlmError::InvalidApiKey(_) => {
                "Invalid or missing API key. Please check your Gemini API configuration."
                    .to_string()
            }
            LlmError::Http(_) => {
                "Could not reach the AI service. Please check your connection and try again."
                    .to_string()
            }
            LlmError::Api { status: 429, .. } => {
                "The AI service is receiving too many requests. Please try again shortly."
                    .to_string()
            }
            LlmError::Api { .. } => {
                "The AI service returned an error. Please try again.".to_string()
            }
            LlmError::Blocked { .. } => {
                "The AI service declined to answer this request. Try rephrasing your input."
                    .to_string()
            }
            LlmError::EmptyContent => "The AI service returned an empty response. Please try again."
                .to_string(),
        }
    }
}

/// Generation knobs sent with every request. Serialized as Gemini's
/// `generationConfig` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl SessionConfig {
    pub fn with_mime_type(&self, mime: &str) -> Self {
        Self {
            response_mime_type: mime.to_string(),
            ..self.clone()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// Everything the client needs, injected at construction.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub defaults: SessionConfig,
    /// Extra attempts for transient failures. 0 = single best-effort call.
    pub max_retries: u32,
}

/// The seam between the pipeline and the generative service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single-turn call.
    async fn send(&self, prompt: &str, session: &SessionConfig) -> Result<String, LlmError>;

    /// Opens an empty-history chat session and sends one message in it.
    async fn send_in_session(
        &self,
        prompt: &str,
        session: &SessionConfig,
    ) -> Result<String, LlmError>;

    fn model(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    pub fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    generation_config: &'a SessionConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, or the reason there is none.
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::Blocked { reason });
        }

        let candidate = self.candidates.into_iter().next().ok_or(LlmError::EmptyContent)?;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST")) => Err(LlmError::Blocked {
                    reason: reason.to_string(),
                }),
                _ => Err(LlmError::EmptyContent),
            };
        }
        Ok(text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    pub fn defaults(&self) -> &SessionConfig {
        &self.config.defaults
    }

    /// Starts a multi-turn session seeded with `history`.
    pub fn start_chat(&self, session: SessionConfig, history: Vec<Content>) -> ChatSession<'_> {
        ChatSession::new(self, session, history)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Sends the full conversation and returns the model's text.
    /// Transient failures are retried with exponential backoff only when
    /// `max_retries` > 0.
    pub async fn generate_content(
        &self,
        contents: &[Content],
        session: &SessionConfig,
    ) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents,
            generation_config: session,
        };

        let mut attempt = 0;
        loop {
            match self.call_once(api_key, &body).await {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                    warn!(
                        "Gemini call attempt {} failed ({}), retrying after {}ms...",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn call_once(
        &self,
        api_key: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            warn!("Gemini API returned {}: {}", status, message);
            return Err(classify_failure(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: model={}, prompt_tokens={}, output_tokens={}",
                self.config.model, usage.prompt_token_count, usage.candidates_token_count
            );
        }
        parsed.into_text()
    }
}

fn classify_failure(status: u16, message: String) -> LlmError {
    let mentions_key = message.to_ascii_lowercase().contains("api key");
    match status {
        401 | 403 => LlmError::InvalidApiKey(message),
        400 if mentions_key => LlmError::InvalidApiKey(message),
        _ => LlmError::Api { status, message },
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn send(&self, prompt: &str, session: &SessionConfig) -> Result<String, LlmError> {
        self.generate_content(&[Content::user(prompt)], session).await
    }

    async fn send_in_session(
        &self,
        prompt: &str,
        session: &SessionConfig,
    ) -> Result<String, LlmError> {
        let mut chat = self.start_chat(session.clone(), Vec::new());
        chat.send_message(prompt).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
