//! Client-side premium entitlement.
//!
//! `Locked → Unlocked → Expired → Locked`. Expiry is evaluated lazily against the
//! injected [`Clock`] whenever the gate is refreshed or a gated action is attempted.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PremiumState {
    Locked,
    Unlocked {
        code: String,
        expires_at: DateTime<Utc>,
    },
    Expired {
        code: String,
        expired_at: DateTime<Utc>,
    },
}

/// Persisted form, stored under its own key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumRecord {
    pub premium_code: String,
    pub expires_at: DateTime<Utc>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    AiGeneration,
    AtsScoring,
    PremiumTemplate,
    HtmlExport,
    Print,
}

impl fmt::Display for GatedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GatedAction::AiGeneration => "AI generation",
            GatedAction::AtsScoring => "ATS scoring",
            GatedAction::PremiumTemplate => "premium template",
            GatedAction::HtmlExport => "HTML export",
            GatedAction::Print => "print",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    UpgradeRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumBadge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub remaining: String,
}

pub struct PremiumGate {
    state: PremiumState,
    clock: Arc<dyn Clock>,
}

impl PremiumGate {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: PremiumState::Locked,
            clock,
        }
    }

    /// Restores the gate from a persisted record, expiring it right away if its time is up.
    pub fn from_record(record: Option<PremiumRecord>, clock: Arc<dyn Clock>) -> Self {
        let mut gate = Self::new(clock);
        if let Some(record) = record.filter(|r| r.is_valid) {
            gate.state = PremiumState::Unlocked {
                code: record.premium_code,
                expires_at: record.expires_at,
            };
            gate.refresh();
        }
        gate
    }

    pub fn state(&self) -> &PremiumState {
        &self.state
    }

    pub fn unlock(&mut self, code: impl Into<String>, expires_at: DateTime<Utc>) {
        let code = code.into();
        info!(%expires_at, "premium unlocked");
        self.state = PremiumState::Unlocked { code, expires_at };
    }

    /// True iff unlocked and not yet past expiry. Never changes state.
    pub fn has_active_premium(&self) -> bool {
        matches!(&self.state, PremiumState::Unlocked { expires_at, .. } if self.clock.now() < *expires_at)
    }

    /// The code to present to the server for gated endpoints.
    pub fn active_code(&self) -> Option<&str> {
        match &self.state {
            PremiumState::Unlocked { code, expires_at } if self.clock.now() < *expires_at => {
                Some(code)
            }
            _ => None,
        }
    }

    /// Moves an unlocked gate past its expiry to `Expired`.
    pub fn refresh(&mut self) -> &PremiumState {
        if let PremiumState::Unlocked { code, expires_at } = &self.state {
            if self.clock.now() >= *expires_at {
                info!(%expires_at, "premium expired");
                self.state = PremiumState::Expired {
                    code: code.clone(),
                    expired_at: *expires_at,
                };
            }
        }
        &self.state
    }

    /// The user has seen the expiry notice.
    pub fn acknowledge_expiry(&mut self) {
        if matches!(self.state, PremiumState::Expired { .. }) {
            self.state = PremiumState::Locked;
        }
    }

    /// Drops any entitlement, e.g. after the server rejected the code.
    pub fn clear(&mut self) {
        self.state = PremiumState::Locked;
    }

    /// Decides whether `action` may run. An expired gate is reset to locked.
    pub fn check(&mut self, action: GatedAction) -> GateDecision {
        self.refresh();
        match self.state {
            PremiumState::Unlocked { .. } => GateDecision::Proceed,
            PremiumState::Expired { .. } => {
                self.state = PremiumState::Locked;
                info!(%action, "premium expired, upgrade required");
                GateDecision::UpgradeRequired
            }
            PremiumState::Locked => {
                info!(%action, "premium required");
                GateDecision::UpgradeRequired
            }
        }
    }

    /// Record to persist; `None` means the stored record should be removed.
    pub fn to_record(&self) -> Option<PremiumRecord> {
        match &self.state {
            PremiumState::Locked => None,
            PremiumState::Unlocked { code, expires_at } => Some(PremiumRecord {
                premium_code: code.clone(),
                expires_at: *expires_at,
                is_valid: true,
            }),
            PremiumState::Expired { code, expired_at } => Some(PremiumRecord {
                premium_code: code.clone(),
                expires_at: *expired_at,
                is_valid: false,
            }),
        }
    }

    pub fn badge(&self) -> Option<PremiumBadge> {
        let PremiumState::Unlocked { code, expires_at } = &self.state else {
            return None;
        };
        let remaining = *expires_at - self.clock.now();
        if remaining <= chrono::Duration::zero() {
            return None;
        }
        Some(PremiumBadge {
            code: code.clone(),
            expires_at: *expires_at,
            remaining: format!("{}h {}m", remaining.num_hours(), remaining.num_minutes() % 60),
        })
    }
}
