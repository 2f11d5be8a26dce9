//! Axum route handlers for the Premium API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::payment::gateway::GatewayError;
use crate::payment::models::{gross_amount_from_body, OrderStatus};
use crate::premium::codes::CodeValidation;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub order_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub premium_code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Entitlement check shared by gated endpoints
// ────────────────────────────────────────────────────────────────────────────

/// Returns the code's expiry, or 402 with a message mentioning "Premium".
pub fn require_premium(state: &AppState, code: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
        return Err(AppError::PremiumRequired(
            "Premium access required. Please upgrade to use this feature.".to_string(),
        ));
    };
    match state.codes.validate(code) {
        CodeValidation::Valid { expires_at } => Ok(expires_at),
        CodeValidation::Expired { .. } => Err(AppError::PremiumRequired(
            "Premium access has expired. Please upgrade again.".to_string(),
        )),
        CodeValidation::Unknown | CodeValidation::Malformed => Err(AppError::PremiumRequired(
            "Invalid Premium code".to_string(),
        )),
    }
}

fn validation_message(validation: &CodeValidation) -> Option<String> {
    match validation {
        CodeValidation::Valid { .. } => None,
        CodeValidation::Expired { .. } => Some("Premium code has expired".to_string()),
        CodeValidation::Unknown => Some("Premium code not found".to_string()),
        CodeValidation::Malformed => {
            Some("Premium code should look like QUICK-XXXX-XXXX".to_string())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/premium/verify
///
/// Confirms the order settled for the full premium price (ledger first, then the
/// provider) and issues its code.
pub async fn handle_verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let order_id = request.order_id.trim();
    if order_id.is_empty() {
        return Err(AppError::Validation("orderId is required".to_string()));
    }

    let (status, paid) = match state.ledger.get(order_id) {
        Some(record) if record.status == OrderStatus::Success => {
            (OrderStatus::Success, record.gross_amount)
        }
        _ => {
            let body = match state.gateway.transaction_status(order_id).await {
                Ok(body) => body,
                Err(GatewayError::Api { status: 404, .. }) => {
                    return Err(AppError::NotFound(format!("Order {order_id} not found")))
                }
                Err(e) => return Err(AppError::upstream("Failed to verify payment", e)),
            };
            let status = OrderStatus::from_status_body(&body);
            let paid = gross_amount_from_body(&body);
            if status != OrderStatus::Unknown {
                state.ledger.record(order_id, status, paid, state.clock.now());
            }
            (status, paid)
        }
    };

    if status != OrderStatus::Success {
        warn!(order_id, status = status.as_str(), "premium verify on unsettled order");
        return Err(AppError::PaymentNotSettled(format!(
            "Payment status is {}",
            status.as_str()
        )));
    }

    let price = state.config.premium_price;
    if paid != Some(price) {
        warn!(order_id, ?paid, price, "premium verify on order with wrong amount");
        return Err(AppError::PaymentNotSettled(format!(
            "Paid amount does not match the price of {price}"
        )));
    }

    let grant = state.codes.issue_for_order(order_id);
    info!(order_id, "premium verified");

    Ok(Json(VerifyResponse {
        success: true,
        premium_code: grant.code,
        expires_at: grant.expires_at,
    }))
}

/// POST /api/premium/validate
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let validation = state.codes.validate(&request.code);
    let expires_at = match validation {
        CodeValidation::Valid { expires_at } => Some(expires_at),
        _ => None,
    };
    Json(ValidateResponse {
        valid: expires_at.is_some(),
        expires_at,
        message: validation_message(&validation),
    })
}
