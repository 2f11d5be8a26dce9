use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::payment::models::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: String,
    pub status: OrderStatus,
    /// Whole currency units charged, once known.
    pub gross_amount: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Last known status per provider order id, fed by init and by verified webhooks.
#[derive(Default)]
pub struct OrderLedger {
    orders: RwLock<HashMap<String, OrderRecord>>,
}

impl OrderLedger {
    /// Stores the latest status. An unknown amount keeps the one already on file.
    pub fn record(
        &self,
        order_id: &str,
        status: OrderStatus,
        gross_amount: Option<i64>,
        at: DateTime<Utc>,
    ) {
        let mut orders = self.orders.write().unwrap_or_else(|e| e.into_inner());
        let gross_amount =
            gross_amount.or_else(|| orders.get(order_id).and_then(|r| r.gross_amount));
        orders.insert(
            order_id.to_string(),
            OrderRecord {
                order_id: order_id.to_string(),
                status,
                gross_amount,
                updated_at: at,
            },
        );
    }

    pub fn get(&self, order_id: &str) -> Option<OrderRecord> {
        let orders = self.orders.read().unwrap_or_else(|e| e.into_inner());
        orders.get(order_id).cloned()
    }
}
