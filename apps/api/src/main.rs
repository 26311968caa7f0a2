mod config;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::sidecar::SidecarClient;
use crate::extraction::{PdfBackend, TextExtractor};
use crate::generation::pipeline::Pipeline;
use crate::generation::slots::SlotBoard;
use crate::llm_client::{GeminiClient, GeminiConfig, SessionConfig};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-ai API v{}", env!("CARGO_PKG_VERSION"));

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    // Initialize model client
    let gemini = GeminiClient::new(
        http.clone(),
        GeminiConfig {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            api_base: config.gemini_api_base.clone(),
            defaults: SessionConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
                ..SessionConfig::default()
            },
            max_retries: config.max_retries,
        },
    );
    if config.gemini_api_key.is_none() {
        tracing::warn!(
            "GEMINI_API_KEY is not set; generation requests will fail until it is configured"
        );
    }
    info!("Model client initialized (model: {})", config.gemini_model);

    // Initialize text extraction
    let pdf = match &config.pdf_extractor_url {
        Some(url) => PdfBackend::Sidecar(SidecarClient::new(http.clone(), url.clone())),
        None => PdfBackend::Local,
    };
    info!("PDF extraction backend: {}", pdf.describe());

    let defaults = gemini.defaults().clone();
    let pipeline = Pipeline::new(Arc::new(gemini), TextExtractor::new(pdf), defaults);

    let state = AppState {
        pipeline: Arc::new(pipeline),
        slots: SlotBoard::new(),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        // TODO: restrict origins once the web client has a fixed host
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
