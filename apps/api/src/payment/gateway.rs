//! Payment provider client. Everything that talks to Midtrans goes through
//! [`PaymentGateway`] so handlers can be tested against a fake.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::payment::models::{SnapTransaction, SnapTransactionRequest};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a Snap transaction and returns the popup token.
    async fn create_transaction(
        &self,
        request: &SnapTransactionRequest,
    ) -> Result<SnapTransaction, GatewayError>;

    /// Raw provider status body for an order.
    async fn transaction_status(&self, order_id: &str) -> Result<Value, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    status_message: Option<String>,
}

fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(parsed) if !parsed.error_messages.is_empty() => parsed.error_messages.join("; "),
        Ok(ProviderErrorBody {
            status_message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    }
}

/// Midtrans Snap (transaction creation) and Core API (status) over HTTP basic auth with
/// the server key as user name.
#[derive(Clone)]
pub struct MidtransGateway {
    client: Client,
    server_key: String,
    snap_url: String,
    api_url: String,
}

impl MidtransGateway {
    pub fn new(server_key: String, snap_url: &str, api_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            server_key,
            snap_url: snap_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_transaction(
        &self,
        request: &SnapTransactionRequest,
    ) -> Result<SnapTransaction, GatewayError> {
        let url = format!("{}/snap/v1/transactions", self.snap_url);
        debug!(order_id = %request.transaction_details.order_id, "creating snap transaction");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.server_key, Some(""))
            .header("accept", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Snap returned {}: {}", status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        Ok(response.json().await?)
    }

    async fn transaction_status(&self, order_id: &str) -> Result<Value, GatewayError> {
        let url = format!("{}/v2/{}/status", self.api_url, order_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.server_key, Some(""))
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Status API returned {}: {}", status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let body: Value = response.json().await?;

        // The Core API reports unknown orders with HTTP 200 and an error status_code.
        if let Some(code) = body.get("status_code").and_then(|v| v.as_str()) {
            if code.starts_with('4') || code.starts_with('5') {
                let message = body
                    .get("status_message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Transaction status unavailable")
                    .to_string();
                return Err(GatewayError::Api {
                    status: code.parse().unwrap_or(500),
                    message,
                });
            }
        }

        Ok(body)
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::{GatewayError, PaymentGateway};
    use crate::payment::models::{SnapTransaction, SnapTransactionRequest};

    /// Records created transactions and answers status queries from a map.
    #[derive(Default)]
    pub struct FakeGateway {
        pub created: Mutex<Vec<SnapTransactionRequest>>,
        pub statuses: Mutex<HashMap<String, Value>>,
        pub fail_create: bool,
    }

    impl FakeGateway {
        pub fn with_status(self, order_id: &str, body: Value) -> Self {
            self.statuses
                .lock()
                .unwrap()
                .insert(order_id.to_string(), body);
            self
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_transaction(
            &self,
            request: &SnapTransactionRequest,
        ) -> Result<SnapTransaction, GatewayError> {
            if self.fail_create {
                return Err(GatewayError::Api {
                    status: 401,
                    message: "Access denied".to_string(),
                });
            }
            self.created.lock().unwrap().push(request.clone());
            Ok(SnapTransaction {
                token: "snap-token".to_string(),
                redirect_url: "https://app.sandbox.midtrans.com/snap/v2/vtweb/snap-token"
                    .to_string(),
            })
        }

        async fn transaction_status(&self, order_id: &str) -> Result<Value, GatewayError> {
            self.statuses
                .lock()
                .unwrap()
                .get(order_id)
                .cloned()
                .ok_or_else(|| GatewayError::Api {
                    status: 404,
                    message: "Transaction doesn't exist.".to_string(),
                })
        }
    }
}
