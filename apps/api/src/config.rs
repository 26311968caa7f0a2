use std::str::FromStr;

use anyhow::{Context, Result};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Immutable after startup; cloned into `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional at startup so extraction-only deployments still boot.
    /// Generation calls fail with `LlmError::MissingApiKey` when absent.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    /// When set, PDFs are sent to this sidecar endpoint instead of parsed in-process.
    pub pdf_extractor_url: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            gemini_api_key: non_blank("GEMINI_API_KEY"),
            gemini_model: non_blank("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: non_blank("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            pdf_extractor_url: non_blank("PDF_EXTRACTOR_URL"),
            temperature: parse_or(&lookup, "GENERATION_TEMPERATURE", 0.7)?,
            top_p: parse_or(&lookup, "GENERATION_TOP_P", 0.95)?,
            top_k: parse_or(&lookup, "GENERATION_TOP_K", 64)?,
            max_output_tokens: parse_or(&lookup, "GENERATION_MAX_OUTPUT_TOKENS", 8192)?,
            max_retries: parse_or(&lookup, "GENERATION_MAX_RETRIES", 0)?,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 120)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        _ => Ok(default),
    }
}
