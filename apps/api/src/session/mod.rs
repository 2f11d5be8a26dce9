//! An editing session on the user's device: the editor, the premium gate and the local
//! store, kept in step.
//!
//! Every change that alters the document is saved straight away. Premium state is
//! saved whenever it moves, and removed once the gate is locked again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::cv::defaults::sample_document;
use crate::cv::editor::{EditCommand, EditError, EditOutcome, EditorController};
use crate::cv::models::CvDocument;
use crate::payment::checkout::{
    CheckoutError, CheckoutFlow, CheckoutForm, CheckoutResult, PaymentBackend,
};
use crate::persistence::{self, KeyValueStore, PersistenceError};
use crate::premium::gate::{GateDecision, GatedAction, PremiumBadge, PremiumGate};
use crate::render::html::to_html;
use crate::render::render_document;
use crate::render::themes::Theme;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Upgrade to Premium to use {0}")]
    UpgradeRequired(GatedAction),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("{0}")]
    InvalidCode(String),
}

/// How often [`EditingSession::watch_premium`] refreshes the badge.
pub const PREMIUM_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub struct EditingSession {
    editor: EditorController,
    gate: PremiumGate,
    store: Arc<dyn KeyValueStore>,
}

impl EditingSession {
    /// Restores the last saved document (or the sample one) and the premium record.
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<Self, SessionError> {
        let document = match persistence::load_document(store.as_ref()) {
            Ok(Some(doc)) => doc,
            Ok(None) => sample_document(),
            Err(PersistenceError::Corrupt { key, source }) => {
                warn!(%key, error = %source, "saved document unreadable, starting from sample");
                sample_document()
            }
            Err(e) => return Err(e.into()),
        };
        let record = persistence::load_premium(store.as_ref())?;
        let session = Self {
            editor: EditorController::new(document),
            gate: PremiumGate::from_record(record, clock),
            store,
        };
        session.sync_premium()?;
        Ok(session)
    }

    pub fn document(&self) -> &CvDocument {
        self.editor.document()
    }

    pub fn revision(&self) -> u64 {
        self.editor.revision()
    }

    pub fn gate(&self) -> &PremiumGate {
        &self.gate
    }

    /// Applies one edit. Picking a premium theme is a gated action.
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome, SessionError> {
        if let EditCommand::SetTheme { theme } = &command {
            self.require_theme(*theme)?;
        }
        let outcome = self.editor.apply(command)?;
        self.save_if_changed(&outcome)?;
        Ok(outcome)
    }

    /// Applies a batch, all or nothing.
    pub fn apply_all(&mut self, commands: Vec<EditCommand>) -> Result<EditOutcome, SessionError> {
        for command in &commands {
            if let EditCommand::SetTheme { theme } = command {
                self.require_theme(*theme)?;
            }
        }
        let outcome = self.editor.apply_all(commands)?;
        self.save_if_changed(&outcome)?;
        Ok(outcome)
    }

    fn require_theme(&mut self, theme: Theme) -> Result<(), SessionError> {
        if theme.is_premium() {
            self.require(GatedAction::PremiumTemplate)?;
        }
        Ok(())
    }

    fn save_if_changed(&self, outcome: &EditOutcome) -> Result<(), SessionError> {
        if outcome.changed {
            persistence::save_document(self.store.as_ref(), self.editor.document())?;
        }
        Ok(())
    }

    /// Runs the gate for `action`. A locked or expired gate yields `UpgradeRequired`.
    pub fn require(&mut self, action: GatedAction) -> Result<(), SessionError> {
        let decision = self.gate.check(action);
        self.sync_premium()?;
        match decision {
            GateDecision::Proceed => Ok(()),
            GateDecision::UpgradeRequired => Err(SessionError::UpgradeRequired(action)),
        }
    }

    /// Periodic badge refresh.
    pub fn refresh_premium(&mut self) -> Result<Option<PremiumBadge>, SessionError> {
        self.gate.refresh();
        self.sync_premium()?;
        Ok(self.gate.badge())
    }

    pub fn acknowledge_expiry(&mut self) -> Result<(), SessionError> {
        self.gate.acknowledge_expiry();
        self.sync_premium()
    }

    pub fn activate_premium(
        &mut self,
        code: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.gate.unlock(code, expires_at);
        self.sync_premium()
    }

    /// Runs the checkout and, once the order is verified, unlocks and saves premium.
    /// A pending payment leaves the gate as it was.
    pub async fn upgrade(
        &mut self,
        flow: &CheckoutFlow,
        form: &CheckoutForm,
    ) -> Result<CheckoutResult, SessionError> {
        let result = flow.purchase(form).await?;
        if let CheckoutResult::Unlocked { code, expires_at } = &result {
            self.activate_premium(code.clone(), *expires_at)?;
        }
        Ok(result)
    }

    /// Unlocks with a code the user already has, after the backend confirms it.
    pub async fn redeem_code(
        &mut self,
        backend: &dyn PaymentBackend,
        code: &str,
    ) -> Result<DateTime<Utc>, SessionError> {
        let code = code.trim().to_uppercase();
        let response = backend.validate_code(&code).await?;
        match response.expires_at.filter(|_| response.valid) {
            Some(expires_at) => {
                self.activate_premium(code, expires_at)?;
                Ok(expires_at)
            }
            None => Err(SessionError::InvalidCode(
                response
                    .message
                    .unwrap_or_else(|| "Invalid Premium code".to_string()),
            )),
        }
    }

    /// Publishes a fresh badge every [`PREMIUM_REFRESH_INTERVAL`] until the last
    /// receiver goes away.
    pub async fn watch_premium(
        session: Arc<Mutex<EditingSession>>,
        badges: watch::Sender<Option<PremiumBadge>>,
    ) -> Result<(), SessionError> {
        let mut ticker = tokio::time::interval(PREMIUM_REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let badge = session.lock().await.refresh_premium()?;
            if badges.send(badge).is_err() {
                return Ok(());
            }
        }
    }

    /// Called with the message of a failed feature call. A message naming "Premium"
    /// means the server no longer honours our code, so the entitlement is dropped.
    pub fn handle_feature_error(&mut self, message: &str) -> Result<bool, SessionError> {
        if !message.contains("Premium") {
            return Ok(false);
        }
        info!("server rejected premium code, locking");
        self.gate.clear();
        self.sync_premium()?;
        Ok(true)
    }

    /// Printable HTML of the current document. Premium only.
    pub fn export_html(&mut self) -> Result<String, SessionError> {
        self.require(GatedAction::HtmlExport)?;
        Ok(to_html(&render_document(self.editor.document())))
    }

    /// Print goes through the same rendering as export.
    pub fn print(&mut self) -> Result<String, SessionError> {
        self.require(GatedAction::Print)?;
        Ok(to_html(&render_document(self.editor.document())))
    }

    pub fn export_json(&self) -> Result<String, SessionError> {
        Ok(persistence::export_json(self.editor.document())?)
    }

    /// Replaces the document with a validated backup. On error nothing changes.
    pub fn import_json(&mut self, text: &str) -> Result<(), SessionError> {
        let document = persistence::import_json(text)?;
        self.editor.replace(document);
        persistence::save_document(self.store.as_ref(), self.editor.document())?;
        Ok(())
    }

    pub fn reset_to_sample(&mut self) -> Result<(), SessionError> {
        self.editor.replace(sample_document());
        persistence::save_document(self.store.as_ref(), self.editor.document())?;
        Ok(())
    }

    fn sync_premium(&self) -> Result<(), SessionError> {
        match self.gate.to_record() {
            Some(record) => persistence::save_premium(self.store.as_ref(), &record)?,
            None => persistence::clear_premium(self.store.as_ref())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::cv::sections::{BuiltInSection, SectionKey};
    use crate::payment::checkout::testing::{FakeBackend, FixedPopup, FAKE_CODE};
    use crate::payment::checkout::PopupOutcome;
    use crate::persistence::testing::MemoryStore;
    use crate::persistence::{DOCUMENT_KEY, PREMIUM_KEY};
    use crate::premium::gate::PremiumState;
    use chrono::Duration as ChronoDuration;

    fn open() -> (EditingSession, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::fixed());
        let session = EditingSession::open(store.clone(), clock.clone()).unwrap();
        (session, store, clock)
    }

    #[test]
    fn test_opens_with_sample_and_persists_edits() {
        let (mut session, store, clock) = open();
        assert_eq!(session.document().basic_info.name, "Jane Smith");
        assert!(store.get(DOCUMENT_KEY).unwrap().is_none());

        session
            .apply(EditCommand::UpdateBasicInfo {
                field: "name".to_string(),
                value: "Ada Lovelace".to_string(),
            })
            .unwrap();

        let reopened = EditingSession::open(store.clone(), clock).unwrap();
        assert_eq!(reopened.document().basic_info.name, "Ada Lovelace");
    }

    #[test]
    fn test_failed_batch_leaves_store_untouched() {
        let (mut session, store, _clock) = open();
        let err = session
            .apply_all(vec![
                EditCommand::SetSummary {
                    content: "changed".to_string(),
                },
                EditCommand::RemoveSection {
                    key: SectionKey::BuiltIn(BuiltInSection::Skills),
                },
            ])
            .unwrap_err();
        assert!(matches!(err, SessionError::Edit(EditError::Batch { index: 1, .. })));
        assert!(store.get(DOCUMENT_KEY).unwrap().is_none());
        assert_ne!(session.document().summary.content, "changed");
    }

    #[test]
    fn test_premium_theme_needs_premium() {
        let (mut session, _store, clock) = open();
        let err = session
            .apply(EditCommand::SetTheme {
                theme: Theme::Academic,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::UpgradeRequired(GatedAction::PremiumTemplate)));

        session
            .apply(EditCommand::SetTheme { theme: Theme::Basic })
            .unwrap();

        session
            .activate_premium("QUICK-ABCD-1234", clock.now() + ChronoDuration::hours(24))
            .unwrap();
        session
            .apply(EditCommand::SetTheme {
                theme: Theme::Academic,
            })
            .unwrap();
        assert_eq!(session.document().active_theme, Theme::Academic);
    }

    #[test]
    fn test_premium_survives_reopen_until_expiry() {
        let (mut session, store, clock) = open();
        session
            .activate_premium("QUICK-ABCD-1234", clock.now() + ChronoDuration::hours(24))
            .unwrap();
        assert!(store.get(PREMIUM_KEY).unwrap().is_some());

        let reopened = EditingSession::open(store.clone(), clock.clone()).unwrap();
        assert!(reopened.gate().has_active_premium());

        clock.advance(ChronoDuration::hours(24));
        let mut expired = EditingSession::open(store.clone(), clock).unwrap();
        assert!(matches!(expired.gate().state(), PremiumState::Expired { .. }));

        let err = expired.export_html().unwrap_err();
        assert!(matches!(err, SessionError::UpgradeRequired(GatedAction::HtmlExport)));
        assert_eq!(expired.gate().state(), &PremiumState::Locked);
        assert!(store.get(PREMIUM_KEY).unwrap().is_none());
    }

    #[test]
    fn test_premium_error_message_locks_gate() {
        let (mut session, store, clock) = open();
        session
            .activate_premium("QUICK-ABCD-1234", clock.now() + ChronoDuration::hours(24))
            .unwrap();

        assert!(!session.handle_feature_error("network down").unwrap());
        assert!(session.gate().has_active_premium());

        assert!(session.handle_feature_error("Invalid Premium code").unwrap());
        assert!(!session.gate().has_active_premium());
        assert!(store.get(PREMIUM_KEY).unwrap().is_none());
    }

    #[test]
    fn test_export_with_premium_and_badge() {
        let (mut session, _store, clock) = open();
        session
            .activate_premium("QUICK-ABCD-1234", clock.now() + ChronoDuration::hours(3))
            .unwrap();
        clock.advance(ChronoDuration::minutes(30));

        let badge = session.refresh_premium().unwrap().unwrap();
        assert_eq!(badge.remaining, "2h 30m");
        assert!(session.export_html().unwrap().contains("Jane Smith"));
        assert!(session.print().is_ok());
    }

    #[test]
    fn test_import_replaces_and_persists() {
        let (mut session, store, _clock) = open();
        let mut backup = sample_document();
        backup.basic_info.name = "Grace Hopper".to_string();
        let json = serde_json::to_string(&backup).unwrap();

        session.import_json(&json).unwrap();
        assert_eq!(session.document().basic_info.name, "Grace Hopper");
        assert!(store.get(DOCUMENT_KEY).unwrap().unwrap().contains("Grace Hopper"));

        let before = session.revision();
        assert!(session.import_json("[1, 2").is_err());
        assert_eq!(session.revision(), before);
        assert_eq!(session.document().basic_info.name, "Grace Hopper");
    }

    #[test]
    fn test_corrupt_document_falls_back_to_sample() {
        let store = Arc::new(MemoryStore::default());
        store.set(DOCUMENT_KEY, "{broken").unwrap();
        let session =
            EditingSession::open(store.clone(), Arc::new(ManualClock::fixed())).unwrap();
        assert_eq!(session.document().basic_info.name, "Jane Smith");
    }

    #[test]
    fn test_json_export_is_ungated() {
        let (session, _store, _clock) = open();
        let json = session.export_json().unwrap();
        assert!(json.contains("Jane Smith"));
    }

    fn checkout(
        outcome: PopupOutcome,
        clock: &Arc<ManualClock>,
    ) -> (CheckoutFlow, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new(clock.now() + ChronoDuration::hours(24)));
        let flow = CheckoutFlow::new(
            backend.clone(),
            Arc::new(FixedPopup(outcome)),
            clock.clone(),
            19000,
        );
        (flow, backend)
    }

    fn checkout_form() -> CheckoutForm {
        CheckoutForm {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "0812".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upgrade_persists_premium_and_unblocks_export() {
        let (mut session, store, clock) = open();
        let err = session.export_html().unwrap_err();
        assert!(matches!(err, SessionError::UpgradeRequired(GatedAction::HtmlExport)));

        let (flow, _backend) = checkout(PopupOutcome::Success, &clock);
        let result = session.upgrade(&flow, &checkout_form()).await.unwrap();
        assert!(matches!(result, CheckoutResult::Unlocked { .. }));

        let saved = persistence::load_premium(store.as_ref()).unwrap().unwrap();
        assert_eq!(saved.premium_code, FAKE_CODE);
        assert!(session.export_html().unwrap().contains("Jane Smith"));

        let reopened = EditingSession::open(store.clone(), clock).unwrap();
        assert!(reopened.gate().has_active_premium());
    }

    #[tokio::test]
    async fn test_pending_or_closed_checkout_keeps_gate_locked() {
        let (mut session, store, clock) = open();

        let (flow, _backend) = checkout(PopupOutcome::Pending, &clock);
        let result = session.upgrade(&flow, &checkout_form()).await.unwrap();
        assert!(matches!(result, CheckoutResult::Pending { .. }));

        let (flow, _backend) = checkout(PopupOutcome::Closed, &clock);
        let err = session.upgrade(&flow, &checkout_form()).await.unwrap_err();
        assert!(matches!(err, SessionError::Checkout(CheckoutError::PopupClosed)));

        assert!(!session.gate().has_active_premium());
        assert!(store.get(PREMIUM_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redeem_code() {
        let (mut session, store, clock) = open();
        let (_flow, backend) = checkout(PopupOutcome::Success, &clock);

        let err = session
            .redeem_code(backend.as_ref(), "QUICK-ZZZZ-9999")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCode(msg) if msg == "Premium code not found"));
        assert!(!session.gate().has_active_premium());

        let expires_at = session
            .redeem_code(backend.as_ref(), " quick-aaaa-bbbb ")
            .await
            .unwrap();
        assert_eq!(expires_at, clock.now() + ChronoDuration::hours(24));
        let saved = persistence::load_premium(store.as_ref()).unwrap().unwrap();
        assert_eq!(saved.premium_code, FAKE_CODE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_premium_publishes_badge_each_interval() {
        let (mut session, _store, clock) = open();
        session
            .activate_premium(FAKE_CODE, clock.now() + ChronoDuration::hours(3))
            .unwrap();
        let session = Arc::new(Mutex::new(session));
        let (tx, mut rx) = watch::channel(None);
        let task = tokio::spawn(EditingSession::watch_premium(session, tx));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().remaining, "3h 0m");

        clock.advance(ChronoDuration::minutes(30));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().remaining, "2h 30m");

        drop(rx);
        task.await.unwrap().unwrap();
    }
}
