pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Generation API
        .route("/api/v1/generate/:task", post(handlers::handle_generate))
        .route("/api/v1/slots/selection", put(handlers::handle_select_slot))
        .route("/api/v1/quiz/grade", post(handlers::handle_grade_quiz))
        // ATS API (multipart uploads)
        .route("/api/v1/ats/match", post(handlers::handle_ats_match))
        .route("/api/v1/ats/review", post(handlers::handle_resume_review))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
