//! Axum route handlers for the generation API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{Document, MediaType};
use crate::generation::models::{present, GenerationContext, GenerationResult, TaskKind};
use crate::generation::quiz::{grade, GradeRequest, QuizScore};
use crate::generation::slots::SlotRef;
use crate::state::AppState;

const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub context: GenerationContext,
    /// Set when the result is destined for a specific form slot.
    #[serde(default)]
    pub slot: Option<SlotRef>,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub request_id: Uuid,
    pub task: TaskKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotRef>,
    /// True when the slot's form moved its selection elsewhere while this
    /// request was running. Callers must discard stale results.
    pub stale: bool,
    pub generated_at: DateTime<Utc>,
    pub result: GenerationResult,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate/:task
///
/// Runs the pipeline for `task` with a JSON context. Report tasks must carry
/// `resume_text` here; file uploads go through the `/ats` endpoints.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(task): Path<TaskKind>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    validate_context(task, &request.context, false)?;
    let response =
        run_generation(&state, Uuid::new_v4(), task, request.context, request.slot).await?;
    Ok(Json(response))
}

/// POST /api/v1/ats/match
///
/// Multipart: `job_description` text field + `resume` file.
pub async fn handle_ats_match(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GenerationResponse>), AppError> {
    let context = read_resume_upload(multipart).await?;
    validate_context(TaskKind::AtsMatchReport, &context, true)?;
    run_report(&state, Uuid::new_v4(), TaskKind::AtsMatchReport, context).await
}

/// POST /api/v1/ats/review
///
/// Multipart: `resume` file. ATS review without a job description.
pub async fn handle_resume_review(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GenerationResponse>), AppError> {
    let context = read_resume_upload(multipart).await?;
    validate_context(TaskKind::ResumeReview, &context, true)?;
    run_report(&state, Uuid::new_v4(), TaskKind::ResumeReview, context).await
}

/// POST /api/v1/quiz/grade
pub async fn handle_grade_quiz(
    Json(request): Json<GradeRequest>,
) -> Result<Json<QuizScore>, AppError> {
    if request.questions.is_empty() {
        return Err(AppError::Validation("questions cannot be empty".to_string()));
    }
    Ok(Json(grade(&request.questions, &request.answers)))
}

/// PUT /api/v1/slots/selection
///
/// Records which slot of a form the user is looking at. In-flight results for
/// other slots of the same form come back with `stale: true`.
pub async fn handle_select_slot(
    State(state): State<AppState>,
    Json(slot): Json<SlotRef>,
) -> StatusCode {
    state.slots.select(&slot);
    StatusCode::NO_CONTENT
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn run_generation(
    state: &AppState,
    request_id: Uuid,
    task: TaskKind,
    context: GenerationContext,
    slot: Option<SlotRef>,
) -> Result<GenerationResponse, AppError> {
    // Held until the end of this function; dropping it frees the slot on
    // every path, including errors.
    let ticket = slot
        .map(|s| state.slots.begin(s))
        .transpose()
        .map_err(|busy| AppError::Conflict(busy.to_string()))?;

    info!("Generation request {} for {}", request_id, task.as_str());
    let result = state.pipeline.generate(task, context).await?;

    let stale = ticket.as_ref().is_some_and(|t| !t.is_current());
    if stale {
        info!("Generation request {} finished after its slot was deselected", request_id);
    }

    Ok(GenerationResponse {
        request_id,
        task,
        slot: ticket.as_ref().map(|t| t.slot().clone()),
        stale,
        generated_at: Utc::now(),
        result,
    })
}

/// Report flow: extraction failures are returned as an `ExtractionFailure`
/// result rather than an error body, so the page can show them in place of
/// the report.
async fn run_report(
    state: &AppState,
    request_id: Uuid,
    task: TaskKind,
    context: GenerationContext,
) -> Result<(StatusCode, Json<GenerationResponse>), AppError> {
    match run_generation(state, request_id, task, context, None).await {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(err @ AppError::Extraction(_)) => {
            let status = err.status();
            tracing::warn!("Generation request {request_id}: resume extraction failed: {err}");
            Ok((
                status,
                Json(GenerationResponse {
                    request_id,
                    task,
                    slot: None,
                    stale: false,
                    generated_at: Utc::now(),
                    result: GenerationResult::ExtractionFailure {
                        message: err.user_message(),
                    },
                }),
            ))
        }
        Err(err) => Err(err),
    }
}

async fn read_resume_upload(mut multipart: Multipart) -> Result<GenerationContext, AppError> {
    let mut context = GenerationContext::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" | "jobDesc" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job description: {e}")))?;
                context.job_description = Some(text);
            }
            "resume" => {
                let media_type = MediaType::detect(field.content_type(), field.file_name());
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::Validation(format!("Could not read resume upload: {e}"))
                    })?;
                let mut document = Document::new(bytes, media_type);
                if let Some(file_name) = file_name {
                    document = document.with_file_name(file_name);
                }
                context.document = Some(document);
            }
            _ => {}
        }
    }

    Ok(context)
}

/// Request-level checks mirroring the form guards. The prompt builder itself
/// never rejects input.
fn validate_context(
    task: TaskKind,
    ctx: &GenerationContext,
    expects_upload: bool,
) -> Result<(), AppError> {
    let fail = |msg: &str| Err(AppError::Validation(msg.to_string()));

    match task {
        TaskKind::ExperienceBullets
            if present(&ctx.job_title).is_none() || present(&ctx.company).is_none() =>
        {
            fail("Please enter the position title and company name to generate suggestions.")
        }
        TaskKind::QuizQuestions if present(&ctx.job_profile).is_none() => {
            fail("Please select a job profile first.")
        }
        TaskKind::QuizQuestions
            if present(&ctx.difficulty)
                .is_some_and(|d| !DIFFICULTIES.contains(&d.to_ascii_lowercase().as_str())) =>
        {
            fail("difficulty must be one of: easy, medium, hard")
        }
        TaskKind::AtsMatchReport if present(&ctx.job_description).is_none() => {
            fail("Please upload a resume and provide a job description.")
        }
        TaskKind::AtsMatchReport | TaskKind::ResumeReview => {
            let has_resume = if expects_upload {
                ctx.document.is_some()
            } else {
                present(&ctx.resume_text).is_some()
            };
            if has_resume {
                Ok(())
            } else {
                fail("Please upload a resume and provide a job description.")
            }
        }
        _ => Ok(()),
    }
}
