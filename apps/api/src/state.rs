use std::sync::Arc;

use crate::ai::ats::AtsScorer;
use crate::ai::generator::ContentGenerator;
use crate::clock::Clock;
use crate::config::Config;
use crate::payment::gateway::PaymentGateway;
use crate::payment::ledger::OrderLedger;
use crate::premium::codes::PremiumCodeRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Payment provider. Midtrans in production, a fake in tests.
    pub gateway: Arc<dyn PaymentGateway>,
    pub codes: Arc<PremiumCodeRegistry>,
    pub ledger: Arc<OrderLedger>,
    pub generator: Arc<dyn ContentGenerator>,
    /// Pluggable ATS scorer. Default: KeywordAtsScorer.
    pub ats_scorer: Arc<dyn AtsScorer>,
    pub clock: Arc<dyn Clock>,
}

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use super::AppState;
    use crate::ai::ats::KeywordAtsScorer;
    use crate::ai::generator::testing::EchoGenerator;
    use crate::clock::testing::ManualClock;
    use crate::config::testing::test_config;
    use crate::payment::gateway::testing::FakeGateway;
    use crate::payment::ledger::OrderLedger;
    use crate::premium::codes::PremiumCodeRegistry;

    pub fn test_state(gateway: FakeGateway) -> (AppState, Arc<ManualClock>) {
        let config = test_config();
        let clock = Arc::new(ManualClock::fixed());
        let state = AppState {
            codes: Arc::new(PremiumCodeRegistry::new(
                config.premium_duration(),
                clock.clone(),
            )),
            config,
            gateway: Arc::new(gateway),
            ledger: Arc::new(OrderLedger::default()),
            generator: Arc::new(EchoGenerator),
            ats_scorer: Arc::new(KeywordAtsScorer),
            clock: clock.clone(),
        };
        (state, clock)
    }
}
