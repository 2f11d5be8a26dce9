//! Axum route handlers for the AI API. Every endpoint is premium-gated.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai::ats::AtsReport;
use crate::ai::generator::GenerationRequest;
use crate::ai::tailor::tailor_document;
use crate::cv::models::CvDocument;
use crate::errors::AppError;
use crate::premium::handlers::require_premium;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub premium_code: Option<String>,
    #[serde(flatten)]
    pub request: GenerationRequest,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsScoreRequest {
    pub premium_code: Option<String>,
    #[serde(default)]
    pub job_description: String,
    pub document: CvDocument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailorRequest {
    pub premium_code: Option<String>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    pub document: CvDocument,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub success: bool,
    pub document: CvDocument,
}

/// POST /api/ai/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    require_premium(&state, body.premium_code.as_deref())?;
    if body.request.job_title.trim().is_empty() {
        return Err(AppError::Validation("jobTitle cannot be empty".to_string()));
    }

    let content = state.generator.generate(&body.request).await?;
    info!(job_title = %body.request.job_title, "content generated");

    Ok(Json(GenerateResponse {
        success: true,
        content,
    }))
}

/// POST /api/ai/ats-score
pub async fn handle_ats_score(
    State(state): State<AppState>,
    Json(body): Json<AtsScoreRequest>,
) -> Result<Json<AtsReport>, AppError> {
    require_premium(&state, body.premium_code.as_deref())?;
    if body.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }

    let report = state
        .ats_scorer
        .score(&body.document, &body.job_description)
        .await?;
    info!(
        score = report.overall_score,
        backend = %report.scorer_backend,
        "ATS score computed"
    );

    Ok(Json(report))
}

/// POST /api/ai/tailor
///
/// Returns the rewritten document; the caller replaces its CV with it in one step.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(body): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    require_premium(&state, body.premium_code.as_deref())?;
    let job_title = body.job_title.trim();
    let job_description = body.job_description.trim();
    if job_title.is_empty() || job_description.is_empty() {
        return Err(AppError::Validation(
            "jobTitle and jobDescription are required".to_string(),
        ));
    }

    let document = tailor_document(
        state.generator.as_ref(),
        job_title,
        job_description,
        &body.document,
    )
    .await?;

    Ok(Json(TailorResponse {
        success: true,
        document,
    }))
}
