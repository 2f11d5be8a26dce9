//! Axum route handlers for the CV API.
//!
//! The server keeps no documents: every request carries the document it works on.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cv::defaults::sample_document;
use crate::cv::editor::{EditCommand, EditorController};
use crate::cv::models::CvDocument;
use crate::cv::sections::SectionKey;
use crate::errors::AppError;
use crate::persistence::import_json;
use crate::premium::handlers::require_premium;
use crate::render::html::to_html;
use crate::render::render_document;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub document: CvDocument,
    #[serde(default)]
    pub commands: Vec<EditCommand>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub document: CvDocument,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_key: Option<SectionKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub document: CvDocument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub premium_code: Option<String>,
    pub document: CvDocument,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/cv/default
pub async fn handle_default() -> Json<CvDocument> {
    Json(sample_document())
}

/// POST /api/cv/edit
///
/// Applies the whole batch or nothing; a failing command is reported with its index.
pub async fn handle_edit(Json(request): Json<EditRequest>) -> Result<Json<EditResponse>, AppError> {
    let count = request.commands.len();
    let mut editor = EditorController::new(request.document);
    let outcome = editor.apply_all(request.commands)?;
    info!(commands = count, changed = outcome.changed, "edit batch applied");

    Ok(Json(EditResponse {
        document: editor.into_document(),
        changed: outcome.changed,
        created_key: outcome.created_key,
        created_id: outcome.created_id,
    }))
}

/// POST /api/cv/preview
pub async fn handle_preview(Json(request): Json<PreviewRequest>) -> Html<String> {
    Html(to_html(&render_document(&request.document)))
}

/// POST /api/cv/export
///
/// Printable HTML download. Premium only.
pub async fn handle_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_premium(&state, request.premium_code.as_deref())?;
    let html = to_html(&render_document(&request.document));
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"cv.html\""),
        ],
        html,
    ))
}

/// POST /api/cv/import
///
/// Takes a JSON backup as the raw body and returns it once validated.
pub async fn handle_import(body: String) -> Result<Json<CvDocument>, AppError> {
    let document = import_json(&body)?;
    Ok(Json(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::sections::BuiltInSection;
    use crate::payment::gateway::testing::FakeGateway;
    use crate::state::testing::test_state;

    #[tokio::test]
    async fn test_edit_batch_is_all_or_nothing() {
        let document = sample_document();
        let request = EditRequest {
            document: document.clone(),
            commands: vec![
                EditCommand::AddSection {
                    title: "Certifications".to_string(),
                },
                EditCommand::RemoveSection {
                    key: SectionKey::BuiltIn(BuiltInSection::BasicInfo),
                },
            ],
        };
        let err = handle_edit(Json(request)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("Command 1 failed")));
    }

    #[tokio::test]
    async fn test_edit_reports_created_section() {
        let request = EditRequest {
            document: sample_document(),
            commands: vec![EditCommand::AddSection {
                title: "Certifications".to_string(),
            }],
        };
        let response = handle_edit(Json(request)).await.unwrap();
        assert!(response.changed);
        let key = response.created_key.clone().unwrap();
        assert!(response.document.has_section(&key));
    }

    #[tokio::test]
    async fn test_preview_is_html() {
        let Html(body) = handle_preview(Json(PreviewRequest {
            document: sample_document(),
        }))
        .await;
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("Jane Smith"));
    }

    #[tokio::test]
    async fn test_export_requires_premium() {
        let (state, _clock) = test_state(FakeGateway::default());
        let result = handle_export(
            State(state),
            Json(ExportRequest {
                premium_code: None,
                document: sample_document(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::PremiumRequired(_))));
    }

    #[tokio::test]
    async fn test_export_sets_attachment_headers() {
        let (state, _clock) = test_state(FakeGateway::default());
        let code = state.codes.issue_for_order("o-1").code;
        let response = handle_export(
            State(state),
            Json(ExportRequest {
                premium_code: Some(code),
                document: sample_document(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cv.html\""
        );
    }

    #[tokio::test]
    async fn test_import_rejects_garbage() {
        let err = handle_import("{not json".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Invalid JSON file"));
    }

    #[tokio::test]
    async fn test_import_accepts_backup() {
        let original = sample_document();
        let json = serde_json::to_string(&original).unwrap();
        let Json(document) = handle_import(json).await.unwrap();
        assert_eq!(document, original);
    }
}
