use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::extraction::PdfBackend;
use crate::state::AppState;

/// GET /health
/// Returns service status, the configured model, and the PDF extraction backend.
/// When a sidecar is configured its reachability is checked on each call.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let extractor = state.pipeline.extractor();
    let sidecar_reachable = match extractor.backend() {
        PdfBackend::Local => None,
        PdfBackend::Sidecar(client) => Some(client.health().await),
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-ai",
        "model": state.pipeline.model(),
        "api_key_configured": state.config.gemini_api_key.is_some(),
        "pdf_extraction": {
            "backend": extractor.backend().describe(),
            "reachable": sidecar_reachable,
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::extraction::TextExtractor;
    use crate::generation::pipeline::testing::ScriptedGenerator;
    use crate::generation::pipeline::Pipeline;
    use crate::generation::slots::SlotBoard;
    use crate::llm_client::SessionConfig;
    use crate::routes::build_router;

    use super::*;

    #[tokio::test]
    async fn test_health_reports_backend_and_model() {
        let pipeline = Pipeline::new(
            Arc::new(ScriptedGenerator::default()),
            TextExtractor::new(PdfBackend::Local),
            SessionConfig::default(),
        );
        let router = build_router(AppState {
            pipeline: Arc::new(pipeline),
            slots: SlotBoard::new(),
            config: Config::from_lookup(|_| None).unwrap(),
        });

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "scripted");
        assert_eq!(body["api_key_configured"], false);
        assert_eq!(body["pdf_extraction"]["backend"], "local");
        assert!(body["pdf_extraction"]["reachable"].is_null());
    }
}
