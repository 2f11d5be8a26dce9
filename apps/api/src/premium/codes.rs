//! Server-side registry of premium codes issued for settled payments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;

pub const CODE_PREFIX: &str = "QUICK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumGrant {
    pub code: String,
    pub order_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeValidation {
    Valid { expires_at: DateTime<Utc> },
    Expired { expired_at: DateTime<Utc> },
    Unknown,
    Malformed,
}

#[derive(Default)]
struct Grants {
    by_code: HashMap<String, PremiumGrant>,
    code_by_order: HashMap<String, String>,
}

pub struct PremiumCodeRegistry {
    grants: RwLock<Grants>,
    duration: Duration,
    clock: Arc<dyn Clock>,
}

/// Trims and upper-cases user input.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// `QUICK-XXXX-YYYY` with uppercase alphanumeric groups.
pub fn is_well_formed(code: &str) -> bool {
    let mut parts = code.split('-');
    let group_ok = |part: Option<&str>| {
        part.map(|p| {
            p.len() == 4
                && p.chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        })
        .unwrap_or(false)
    };
    parts.next() == Some(CODE_PREFIX)
        && group_ok(parts.next())
        && group_ok(parts.next())
        && parts.next().is_none()
}

fn generate_code() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{CODE_PREFIX}-{}-{}", &hex[..4], &hex[4..8])
}

impl PremiumCodeRegistry {
    pub fn new(duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            grants: RwLock::new(Grants::default()),
            duration,
            clock,
        }
    }

    /// Issues a code for a settled order. Asking again for the same order returns the
    /// grant issued the first time.
    pub fn issue_for_order(&self, order_id: &str) -> PremiumGrant {
        let mut grants = self.grants.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = grants
            .code_by_order
            .get(order_id)
            .and_then(|code| grants.by_code.get(code))
        {
            return existing.clone();
        }

        let mut code = generate_code();
        while grants.by_code.contains_key(&code) {
            code = generate_code();
        }

        let issued_at = self.clock.now();
        let grant = PremiumGrant {
            code: code.clone(),
            order_id: order_id.to_string(),
            issued_at,
            expires_at: issued_at + self.duration,
        };
        grants
            .code_by_order
            .insert(order_id.to_string(), code.clone());
        grants.by_code.insert(code, grant.clone());

        info!(order_id, expires_at = %grant.expires_at, "premium code issued");
        grant
    }

    pub fn validate(&self, input: &str) -> CodeValidation {
        let code = normalize_code(input);
        if !is_well_formed(&code) {
            return CodeValidation::Malformed;
        }
        let grants = self.grants.read().unwrap_or_else(|e| e.into_inner());
        match grants.by_code.get(&code) {
            None => CodeValidation::Unknown,
            Some(grant) if self.clock.now() < grant.expires_at => CodeValidation::Valid {
                expires_at: grant.expires_at,
            },
            Some(grant) => CodeValidation::Expired {
                expired_at: grant.expires_at,
            },
        }
    }
}
