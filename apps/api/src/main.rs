use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quickcv::ai::ats::KeywordAtsScorer;
use quickcv::ai::generator::{ContentGenerator, LlmContentGenerator, UnavailableGenerator};
use quickcv::clock::SystemClock;
use quickcv::config::Config;
use quickcv::llm_client::{self, LlmClient};
use quickcv::payment::gateway::MidtransGateway;
use quickcv::payment::ledger::OrderLedger;
use quickcv::premium::codes::PremiumCodeRegistry;
use quickcv::routes::build_router;
use quickcv::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting QuickCV API v{}", env!("CARGO_PKG_VERSION"));

    // Payment provider
    let gateway = MidtransGateway::new(
        config.midtrans_server_key.clone(),
        &config.midtrans_snap_url,
        &config.midtrans_api_url,
    )?;
    info!("Midtrans gateway initialized ({})", config.midtrans_api_url);

    // AI generation is optional
    let generator: Arc<dyn ContentGenerator> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmContentGenerator(llm))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; AI generation disabled");
            Arc::new(UnavailableGenerator)
        }
    };

    let clock = Arc::new(SystemClock);
    let codes = Arc::new(PremiumCodeRegistry::new(
        config.premium_duration(),
        clock.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        gateway: Arc::new(gateway),
        codes,
        ledger: Arc::new(OrderLedger::default()),
        generator,
        ats_scorer: Arc::new(KeywordAtsScorer),
        clock,
    };

    // The popup and the provider webhook both call in from other origins
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
