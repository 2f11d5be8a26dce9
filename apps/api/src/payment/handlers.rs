//! Axum route handlers for the Payment API (Midtrans Snap proxy).

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::payment::models::{
    AmountInput, CallbackQuery, CustomerDetails, InitPaymentRequest, InitPaymentResponse,
    ItemDetail, OrderStatus, PaymentNotification, SnapTransactionRequest, StatusQuery,
    TransactionDetails, DEFAULT_ITEM_NAME,
};
use crate::payment::signature::verify_notification;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigResponse {
    pub client_key: String,
    pub snap_url: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// POST /api/payment/init
///
/// Creates a Snap transaction. The provider order id gets a millisecond suffix so a
/// retried checkout never collides with an earlier attempt.
pub async fn handle_init(
    State(state): State<AppState>,
    Json(request): Json<InitPaymentRequest>,
) -> Result<Json<InitPaymentResponse>, AppError> {
    let (Some(order_id), Some(amount), Some(email), Some(name)) = (
        non_empty(&request.order_id),
        request.amount.as_ref(),
        non_empty(&request.email),
        non_empty(&request.name),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: orderId, amount, email, name".to_string(),
        ));
    };
    let amount = amount
        .to_whole()
        .ok_or_else(|| AppError::Validation("amount must be a positive number".to_string()))?;

    let provider_order_id = format!("{order_id}-{}", state.clock.now().timestamp_millis());

    let item_details = match request.item_details {
        Some(items) if !items.is_empty() => items,
        _ => vec![ItemDetail {
            id: order_id.to_string(),
            price: amount,
            quantity: 1,
            name: DEFAULT_ITEM_NAME.to_string(),
        }],
    };

    let snap_request = SnapTransactionRequest {
        transaction_details: TransactionDetails {
            order_id: provider_order_id.clone(),
            gross_amount: amount,
        },
        customer_details: CustomerDetails {
            email: email.to_string(),
            phone: request.phone.clone().unwrap_or_default(),
            first_name: name.to_string(),
            last_name: String::new(),
        },
        item_details,
    };

    let transaction = state
        .gateway
        .create_transaction(&snap_request)
        .await
        .map_err(|e| AppError::upstream("Failed to initialize payment", e))?;

    state.ledger.record(
        &provider_order_id,
        OrderStatus::Pending,
        Some(amount),
        state.clock.now(),
    );
    info!(order_id = %provider_order_id, amount, "payment initialized");

    Ok(Json(InitPaymentResponse {
        success: true,
        message: "Payment initialized successfully".to_string(),
        token: transaction.token,
        redirect_url: transaction.redirect_url,
        order_id: provider_order_id,
    }))
}

async fn fetch_status(state: &AppState, order_id: &str) -> Result<Json<Value>, AppError> {
    let data = state
        .gateway
        .transaction_status(order_id)
        .await
        .map_err(|e| AppError::upstream("Failed to get transaction status", e))?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/payment/status?orderId=…
pub async fn handle_status_query(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, AppError> {
    let order_id = non_empty(&query.order_id)
        .ok_or_else(|| AppError::Validation("Order ID required".to_string()))?;
    fetch_status(&state, order_id).await
}

/// GET /api/payment/status/:order_id
pub async fn handle_status_path(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(AppError::Validation("Order ID required".to_string()));
    }
    fetch_status(&state, order_id).await
}

/// POST /api/payment/notification
///
/// Provider webhook. Nothing is recorded unless the signature checks out.
pub async fn handle_notification(
    State(state): State<AppState>,
    Json(notification): Json<PaymentNotification>,
) -> Result<Json<Value>, AppError> {
    if !verify_notification(&notification, &state.config.midtrans_server_key) {
        warn!(order_id = %notification.order_id, "notification signature mismatch");
        return Err(AppError::InvalidSignature);
    }

    let status = OrderStatus::from_provider(
        &notification.transaction_status,
        notification.fraud_status.as_deref(),
    );
    info!(
        order_id = %notification.order_id,
        transaction_status = %notification.transaction_status,
        status = status.as_str(),
        "payment notification"
    );

    if status == OrderStatus::Unknown {
        warn!(
            order_id = %notification.order_id,
            transaction_status = %notification.transaction_status,
            "unhandled transaction status; not recorded"
        );
    } else {
        let gross_amount = AmountInput::Text(notification.gross_amount.clone()).to_whole();
        state.ledger.record(
            &notification.order_id,
            status,
            gross_amount,
            state.clock.now(),
        );
    }

    Ok(Json(json!({ "success": true, "message": "Notification handled" })))
}

/// GET /api/payment/callback
///
/// Browser redirect back from the provider. Always ends on the frontend.
pub async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    info!(
        order_id = ?query.order_id,
        status_code = ?query.status_code,
        transaction_status = ?query.transaction_status,
        "payment callback"
    );

    let params: Vec<(&str, String)> = match non_empty(&query.order_id) {
        None => vec![("payment_status", "error".to_string())],
        Some(order_id) => match state.gateway.transaction_status(order_id).await {
            Ok(body) => {
                let status = body
                    .get("transaction_status")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| query.transaction_status.clone())
                    .unwrap_or_default();
                vec![("payment_status", status), ("order_id", order_id.to_string())]
            }
            Err(e) => {
                error!(order_id, "callback status check failed: {e}");
                vec![("payment_status", "error".to_string())]
            }
        },
    };

    let url = reqwest::Url::parse_with_params(&state.config.frontend_url, &params)
        .map_err(|e| AppError::Config(format!("FRONTEND_URL is not a valid URL: {e}")))?;
    Ok(Redirect::to(url.as_str()))
}

/// GET /api/payment/config
pub async fn handle_config(State(state): State<AppState>) -> Json<PaymentConfigResponse> {
    Json(PaymentConfigResponse {
        client_key: state.config.midtrans_client_key.clone(),
        snap_url: state.config.midtrans_snap_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::payment::gateway::testing::FakeGateway;
    use crate::payment::gateway::PaymentGateway;
    use crate::payment::signature::notification_signature;
    use crate::state::testing::test_state;
    use axum::response::IntoResponse;

    fn init_request() -> InitPaymentRequest {
        InitPaymentRequest {
            order_id: Some("PREMIUM-1700000000000".to_string()),
            amount: Some(AmountInput::Text("19000".to_string())),
            email: Some("jane@example.com".to_string()),
            phone: Some("08123".to_string()),
            name: Some("Jane".to_string()),
            item_details: None,
        }
    }

    #[tokio::test]
    async fn test_init_builds_default_item_and_suffix() {
        let (state, clock) = test_state(FakeGateway::default());
        let response = handle_init(State(state.clone()), Json(init_request()))
            .await
            .unwrap();

        let expected_id = format!("PREMIUM-1700000000000-{}", clock.now().timestamp_millis());
        assert_eq!(response.order_id, expected_id);
        assert_eq!(response.token, "snap-token");
        assert_eq!(
            state.ledger.get(&expected_id).unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_init_sends_default_item() {
        let gateway = std::sync::Arc::new(FakeGateway::default());
        let (mut state, _clock) = test_state(FakeGateway::default());
        let shared: std::sync::Arc<dyn PaymentGateway> = gateway.clone();
        state.gateway = shared;
        let response = handle_init(State(state), Json(init_request())).await.unwrap();
        assert!(response.success);

        let created = gateway.created.lock().unwrap();
        let sent = &created[0];
        assert_eq!(sent.transaction_details.gross_amount, 19000);
        assert_eq!(sent.item_details.len(), 1);
        assert_eq!(sent.item_details[0].id, "PREMIUM-1700000000000");
        assert_eq!(sent.item_details[0].name, DEFAULT_ITEM_NAME);
        assert_eq!(sent.customer_details.first_name, "Jane");
        assert_eq!(sent.customer_details.last_name, "");
    }

    #[tokio::test]
    async fn test_init_missing_fields() {
        let (state, _clock) = test_state(FakeGateway::default());
        let mut request = init_request();
        request.email = Some("  ".to_string());
        let err = handle_init(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("orderId, amount")));
    }

    #[tokio::test]
    async fn test_init_provider_failure_is_upstream() {
        let (state, _clock) = test_state(FakeGateway {
            fail_create: true,
            ..Default::default()
        });
        let err = handle_init(State(state), Json(init_request()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { context, .. } if context == "Failed to initialize payment"));
    }

    fn signed(order_id: &str, transaction_status: &str, key: &str) -> PaymentNotification {
        PaymentNotification {
            order_id: order_id.to_string(),
            status_code: "200".to_string(),
            gross_amount: "19000.00".to_string(),
            signature_key: notification_signature(order_id, "200", "19000.00", key),
            transaction_status: transaction_status.to_string(),
            fraud_status: None,
        }
    }

    #[tokio::test]
    async fn test_notification_records_verified_status() {
        let (state, _clock) = test_state(FakeGateway::default());
        let key = state.config.midtrans_server_key.clone();
        let Json(body) =
            handle_notification(State(state.clone()), Json(signed("o-1", "settlement", &key)))
                .await
                .unwrap();
        assert_eq!(body["success"], true);
        let record = state.ledger.get("o-1").unwrap();
        assert_eq!(record.status, OrderStatus::Success);
        assert_eq!(record.gross_amount, Some(19000));
    }

    #[tokio::test]
    async fn test_notification_bad_signature_leaves_ledger_alone() {
        let (state, _clock) = test_state(FakeGateway::default());
        let err = handle_notification(
            State(state.clone()),
            Json(signed("o-1", "settlement", "wrong-key")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidSignature));
        assert!(state.ledger.get("o-1").is_none());
    }

    #[tokio::test]
    async fn test_notification_unknown_status_not_recorded() {
        let (state, _clock) = test_state(FakeGateway::default());
        let key = state.config.midtrans_server_key.clone();
        let Json(body) =
            handle_notification(State(state.clone()), Json(signed("o-2", "refund", &key)))
                .await
                .unwrap();
        assert_eq!(body["message"], "Notification handled");
        assert!(state.ledger.get("o-2").is_none());
    }

    #[tokio::test]
    async fn test_status_query_requires_order_id() {
        let (state, _clock) = test_state(FakeGateway::default());
        let err = handle_status_query(State(state), Query(StatusQuery { order_id: None }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Order ID required"));
    }

    #[tokio::test]
    async fn test_callback_redirects_with_provider_status() {
        let gateway = FakeGateway::default()
            .with_status("o-1", json!({"transaction_status": "settlement"}));
        let (state, _clock) = test_state(gateway);
        let redirect = handle_callback(
            State(state),
            Query(CallbackQuery {
                order_id: Some("o-1".to_string()),
                status_code: Some("200".to_string()),
                transaction_status: Some("pending".to_string()),
            }),
        )
        .await
        .unwrap()
        .into_response();
        let location = redirect.headers()["location"].to_str().unwrap();
        assert_eq!(
            location,
            "http://localhost:5173/?payment_status=settlement&order_id=o-1"
        );
    }

    #[tokio::test]
    async fn test_callback_without_order_redirects_error() {
        let (state, _clock) = test_state(FakeGateway::default());
        let redirect = handle_callback(
            State(state),
            Query(CallbackQuery {
                order_id: None,
                status_code: None,
                transaction_status: None,
            }),
        )
        .await
        .unwrap()
        .into_response();
        let location = redirect.headers()["location"].to_str().unwrap();
        assert_eq!(location, "http://localhost:5173/?payment_status=error");
    }
}
