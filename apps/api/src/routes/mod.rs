pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ai::handlers as ai;
use crate::cv::handlers as cv;
use crate::payment::handlers as payment;
use crate::premium::handlers as premium;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Payment API (Midtrans proxy)
        .route("/api/payment/init", post(payment::handle_init))
        .route("/api/payment/status", get(payment::handle_status_query))
        .route(
            "/api/payment/status/:order_id",
            get(payment::handle_status_path),
        )
        .route(
            "/api/payment/notification",
            post(payment::handle_notification),
        )
        .route("/api/payment/callback", get(payment::handle_callback))
        .route("/api/payment/config", get(payment::handle_config))
        // Premium API
        .route("/api/premium/verify", post(premium::handle_verify))
        .route("/api/premium/validate", post(premium::handle_validate))
        // CV API
        .route("/api/cv/default", get(cv::handle_default))
        .route("/api/cv/edit", post(cv::handle_edit))
        .route("/api/cv/preview", post(cv::handle_preview))
        .route("/api/cv/export", post(cv::handle_export))
        .route("/api/cv/import", post(cv::handle_import))
        // AI API
        .route("/api/ai/generate", post(ai::handle_generate))
        .route("/api/ai/ats-score", post(ai::handle_ats_score))
        .route("/api/ai/tailor", post(ai::handle_tailor))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::gateway::testing::FakeGateway;
    use crate::payment::models::OrderStatus;
    use crate::payment::signature::notification_signature;
    use crate::state::testing::test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_init_missing_fields_is_400() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(json_request(
                Method::POST,
                "/api/payment/init",
                json!({"orderId": "PREMIUM-1", "amount": 19000}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "Missing required fields: orderId, amount, email, name"
        );
    }

    #[tokio::test]
    async fn test_init_success_contract() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(json_request(
                Method::POST,
                "/api/payment/init",
                json!({
                    "orderId": "PREMIUM-1",
                    "amount": "19000",
                    "email": "jane@example.com",
                    "name": "Jane"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["token"], "snap-token");
        assert!(body["redirect_url"].is_string());
        assert!(body["orderId"].as_str().unwrap().starts_with("PREMIUM-1-"));
    }

    #[tokio::test]
    async fn test_init_wrong_method_is_405() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(Request::get("/api/payment/init").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_notification_bad_signature_is_403() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state.clone())
            .oneshot(json_request(
                Method::POST,
                "/api/payment/notification",
                json!({
                    "order_id": "o-1",
                    "status_code": "200",
                    "gross_amount": "19000.00",
                    "signature_key": "deadbeef",
                    "transaction_status": "settlement"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["message"], "Invalid signature");
        assert!(state.ledger.get("o-1").is_none());
    }

    #[tokio::test]
    async fn test_notification_then_verify_issues_code() {
        let (state, _clock) = test_state(FakeGateway::default());
        let key = state.config.midtrans_server_key.clone();
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/payment/notification",
                json!({
                    "order_id": "o-1",
                    "status_code": "200",
                    "gross_amount": "19000.00",
                    "signature_key": notification_signature("o-1", "200", "19000.00", &key),
                    "transaction_status": "capture",
                    "fraud_status": "accept"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.ledger.get("o-1").unwrap().status, OrderStatus::Success);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/premium/verify",
                json!({"orderId": "o-1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["premiumCode"].as_str().unwrap().starts_with("QUICK-"));
    }

    #[tokio::test]
    async fn test_status_without_order_id_is_400() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(Request::get("/api/payment/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Order ID required");
    }

    #[tokio::test]
    async fn test_status_by_path() {
        let gateway = FakeGateway::default()
            .with_status("o-7", json!({"transaction_status": "pending"}));
        let (state, _clock) = test_state(gateway);
        let response = build_router(state)
            .oneshot(Request::get("/api/payment/status/o-7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["transaction_status"], "pending");
    }

    #[tokio::test]
    async fn test_callback_redirects_to_frontend() {
        let gateway = FakeGateway::default()
            .with_status("o-1", json!({"transaction_status": "settlement"}));
        let (state, _clock) = test_state(gateway);
        let response = build_router(state)
            .oneshot(
                Request::get("/api/payment/callback?order_id=o-1&transaction_status=settlement")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://localhost:5173/?payment_status=settlement&order_id=o-1"
        );
    }

    #[tokio::test]
    async fn test_gated_endpoint_without_code_is_402() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(json_request(
                Method::POST,
                "/api/ai/generate",
                json!({"jobTitle": "Engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let message = body_json(response).await["message"].as_str().unwrap().to_string();
        assert!(message.contains("Premium"));
    }

    #[tokio::test]
    async fn test_tailor_route_returns_document() {
        let (state, _clock) = test_state(FakeGateway::default());
        let code = state.codes.issue_for_order("o-1").code;
        let document = serde_json::to_value(crate::cv::defaults::sample_document()).unwrap();
        let response = build_router(state)
            .oneshot(json_request(
                Method::POST,
                "/api/ai/tailor",
                json!({
                    "premiumCode": code,
                    "jobTitle": "Engineer",
                    "jobDescription": "React and TypeScript",
                    "document": document
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["document"]["summary"]["content"], "Tailored for Engineer");
    }

    #[tokio::test]
    async fn test_import_garbage_is_400() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(
                Request::post("/api/cv/import")
                    .body(Body::from("not json at all"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid JSON file");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (state, _clock) = test_state(FakeGateway::default());
        let response = build_router(state)
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
