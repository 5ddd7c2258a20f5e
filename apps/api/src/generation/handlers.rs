//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::generation::generator::{GenerateResumeRequest, GenerateResumeResponse};
use crate::state::AppState;

/// POST /api/generate-resume
///
/// Generates a tailored LaTeX resume, compiling it to PDF when enabled.
/// A failed compilation still answers 200 with `pdf_error` set.
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    body: Result<Json<GenerateResumeRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<GenerateResumeResponse>, AppError> {
    let Json(request) = body?;
    let response = state.pipeline().run(request).await?;
    Ok(Json(response))
}
