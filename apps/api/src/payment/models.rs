use serde::{Deserialize, Serialize};

/// Default line item name when the caller sends none.
pub const DEFAULT_ITEM_NAME: &str = "Service Payment";

// ────────────────────────────────────────────────────────────────────────────
// Backend API (what the client sends us)
// ────────────────────────────────────────────────────────────────────────────

/// Amounts arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AmountInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AmountInput {
    /// Whole currency units; `None` for anything non-positive or unparseable.
    pub fn to_whole(&self) -> Option<i64> {
        let value = match self {
            AmountInput::Integer(v) => *v,
            AmountInput::Float(v) if v.is_finite() => v.trunc() as i64,
            AmountInput::Float(_) => return None,
            AmountInput::Text(s) => {
                let s = s.trim();
                let digits: String = s
                    .char_indices()
                    .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
                    .map(|(_, c)| c)
                    .collect();
                digits.parse().ok()?
            }
        };
        (value > 0).then_some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    pub price: i64,
    pub quantity: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentRequest {
    pub order_id: Option<String>,
    pub amount: Option<AmountInput>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub item_details: Option<Vec<ItemDetail>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    #[serde(rename = "redirect_url")]
    pub redirect_url: String,
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub order_id: Option<String>,
    pub status_code: Option<String>,
    pub transaction_status: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Provider API (Snap)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetails {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetail>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnapTransaction {
    pub token: String,
    pub redirect_url: String,
}

/// Webhook body. Every field defaults to empty so that a malformed notification fails
/// signature verification instead of body parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotification {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub signature_key: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
}

/// Our view of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Challenge,
    Success,
    Pending,
    Failed,
    Expired,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    pub fn from_provider(transaction_status: &str, fraud_status: Option<&str>) -> Self {
        match (transaction_status, fraud_status) {
            ("capture", Some("challenge")) => OrderStatus::Challenge,
            ("capture", Some("accept") | None) => OrderStatus::Success,
            ("settlement", _) => OrderStatus::Success,
            ("pending", _) => OrderStatus::Pending,
            ("deny", _) => OrderStatus::Failed,
            ("expire", _) => OrderStatus::Expired,
            ("cancel", _) => OrderStatus::Cancelled,
            _ => OrderStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Challenge => "challenge",
            OrderStatus::Success => "success",
            OrderStatus::Pending => "pending",
            OrderStatus::Failed => "failed",
            OrderStatus::Expired => "expired",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Reads `transaction_status` / `fraud_status` out of a provider status body.
    pub fn from_status_body(body: &serde_json::Value) -> Self {
        let transaction_status = body
            .get("transaction_status")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let fraud_status = body.get("fraud_status").and_then(|v| v.as_str());
        Self::from_provider(transaction_status, fraud_status)
    }
}

/// `gross_amount` out of a provider body, which sends it as `"19000.00"`.
pub fn gross_amount_from_body(body: &serde_json::Value) -> Option<i64> {
    let value = body.get("gross_amount")?.clone();
    serde_json::from_value::<AmountInput>(value).ok()?.to_whole()
}
