use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cv::editor::EditError;
use crate::llm_client::LlmError;
use crate::payment::gateway::GatewayError;
use crate::persistence::PersistenceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Premium required: {0}")]
    PremiumRequired(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Payment not settled: {0}")]
    PaymentNotSettled(String),

    /// A provider call failed. `context` is what the client sees; `detail` is only logged.
    #[error("{context}: {detail}")]
    Upstream { context: &'static str, detail: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn upstream(context: &'static str, error: GatewayError) -> Self {
        AppError::Upstream {
            context,
            detail: error.to_string(),
        }
    }
}

impl From<EditError> for AppError {
    fn from(e: EditError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::InvalidImport { .. } => AppError::Validation(e.to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PremiumRequired(msg) => {
                (StatusCode::PAYMENT_REQUIRED, "PREMIUM_REQUIRED", msg.clone())
            }
            AppError::InvalidSignature => (
                StatusCode::FORBIDDEN,
                "INVALID_SIGNATURE",
                "Invalid signature".to_string(),
            ),
            AppError::PaymentNotSettled(msg) => {
                (StatusCode::CONFLICT, "PAYMENT_NOT_SETTLED", msg.clone())
            }
            AppError::Upstream { context, detail } => {
                tracing::error!("{context}: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_ERROR",
                    context.to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "Server configuration error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::PremiumRequired("x".into()), StatusCode::PAYMENT_REQUIRED),
            (AppError::InvalidSignature, StatusCode::FORBIDDEN),
            (AppError::PaymentNotSettled("pending".into()), StatusCode::CONFLICT),
            (AppError::Config("missing key".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_upstream_detail_is_not_echoed() {
        let error = AppError::Upstream {
            context: "Failed to initialize payment",
            detail: "server key sk-secret rejected".to_string(),
        };
        let response = error.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to initialize payment");
        assert!(!bytes.windows(9).any(|w| w == b"sk-secret"));
    }

    #[test]
    fn test_invalid_import_maps_to_validation() {
        let error: AppError = crate::persistence::import_json("nope").unwrap_err().into();
        assert!(matches!(error, AppError::Validation(ref m) if m == "Invalid JSON file"));
    }
}
