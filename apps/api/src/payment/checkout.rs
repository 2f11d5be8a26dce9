//! Client side of the premium purchase: validate the form, ask the backend for a Snap
//! token, run the popup, then verify the order. The caller unlocks its gate with the
//! returned code (see `EditingSession::upgrade`).
//!
//! Only one checkout may be in flight at a time. The guard is taken with a
//! compare-and-swap before the first await and released when the ticket drops, so
//! every outcome (including an early error return) frees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::payment::models::InitPaymentResponse;
use crate::premium::handlers::{
    ValidateRequest, ValidateResponse, VerifyRequest, VerifyResponse,
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please fill in your {0}")]
    MissingField(&'static str),

    #[error("A payment is already in progress")]
    InFlight,

    #[error("Payment backend error: {0}")]
    Backend(String),

    #[error("Payment popup was closed before completing")]
    PopupClosed,

    #[error("Payment failed: {0}")]
    PopupFailed(String),
}

impl From<reqwest::Error> for CheckoutError {
    fn from(e: reqwest::Error) -> Self {
        CheckoutError::Backend(e.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CheckoutForm {
    fn validate(&self) -> Result<(), CheckoutError> {
        for (label, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone number", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(label));
            }
        }
        Ok(())
    }
}

/// Terminal popup results. Each one ends the checkout and releases the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupOutcome {
    Success,
    Pending,
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutResult {
    Unlocked {
        code: String,
        expires_at: DateTime<Utc>,
    },
    /// Payment accepted but not settled yet; the user comes back later.
    Pending { order_id: String },
}

// ────────────────────────────────────────────────────────────────────────────
// In-flight guard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InFlightGuard {
    busy: AtomicBool,
}

/// Holding one means a checkout is running. Dropping it releases the guard.
pub struct InFlightTicket<'a> {
    guard: &'a InFlightGuard,
}

impl InFlightGuard {
    pub fn try_acquire(&self) -> Option<InFlightTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightTicket { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Seams
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub order_id: String,
    pub amount: i64,
    pub email: String,
    pub phone: String,
    pub name: String,
}

/// Our own payment API, as seen from the client.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn init_payment(&self, payload: &InitPayload)
        -> Result<InitPaymentResponse, CheckoutError>;

    async fn verify_premium(&self, order_id: &str) -> Result<VerifyResponse, CheckoutError>;

    /// Checks a code the user typed in.
    async fn validate_code(&self, code: &str) -> Result<ValidateResponse, CheckoutError>;
}

/// The provider's popup. Resolves once the user finishes, abandons or closes it.
#[async_trait]
pub trait PaymentPopup: Send + Sync {
    async fn open(&self, token: &str) -> PopupOutcome;
}

pub struct HttpPaymentBackend {
    client: Client,
    base_url: String,
}

impl HttpPaymentBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CheckoutError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request failed")
                .to_string();
            return Err(CheckoutError::Backend(format!("{status}: {message}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    async fn init_payment(
        &self,
        payload: &InitPayload,
    ) -> Result<InitPaymentResponse, CheckoutError> {
        self.post("/api/payment/init", payload).await
    }

    async fn verify_premium(&self, order_id: &str) -> Result<VerifyResponse, CheckoutError> {
        let request = VerifyRequest {
            order_id: order_id.to_string(),
        };
        self.post("/api/premium/verify", &request).await
    }

    async fn validate_code(&self, code: &str) -> Result<ValidateResponse, CheckoutError> {
        let request = ValidateRequest {
            code: code.to_string(),
        };
        self.post("/api/premium/validate", &request).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Flow
// ────────────────────────────────────────────────────────────────────────────

pub struct CheckoutFlow {
    backend: Arc<dyn PaymentBackend>,
    popup: Arc<dyn PaymentPopup>,
    clock: Arc<dyn Clock>,
    price: i64,
    guard: InFlightGuard,
}

impl CheckoutFlow {
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        popup: Arc<dyn PaymentPopup>,
        clock: Arc<dyn Clock>,
        price: i64,
    ) -> Self {
        Self {
            backend,
            popup,
            clock,
            price,
            guard: InFlightGuard::default(),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.guard.is_busy()
    }

    pub async fn purchase(&self, form: &CheckoutForm) -> Result<CheckoutResult, CheckoutError> {
        let _ticket = self.guard.try_acquire().ok_or(CheckoutError::InFlight)?;
        form.validate()?;

        let payload = InitPayload {
            order_id: format!("PREMIUM-{}", self.clock.now().timestamp_millis()),
            amount: self.price,
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            name: form.name.trim().to_string(),
        };
        let init = self.backend.init_payment(&payload).await?;
        let order_id = init.order_id;
        info!(%order_id, "checkout started");

        match self.popup.open(&init.token).await {
            PopupOutcome::Success => {
                let verified = self.backend.verify_premium(&order_id).await?;
                info!(%order_id, "premium verified");
                Ok(CheckoutResult::Unlocked {
                    code: verified.premium_code,
                    expires_at: verified.expires_at,
                })
            }
            PopupOutcome::Pending => Ok(CheckoutResult::Pending { order_id }),
            PopupOutcome::Error(message) => {
                warn!(%order_id, "payment popup error: {message}");
                Err(CheckoutError::PopupFailed(message))
            }
            PopupOutcome::Closed => Err(CheckoutError::PopupClosed),
        }
    }
}
