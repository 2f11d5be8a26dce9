use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub midtrans_server_key: String,
    pub midtrans_client_key: String,
    pub midtrans_snap_url: String,
    pub midtrans_api_url: String,
    pub frontend_url: String,
    /// AI generation is unavailable when unset.
    pub anthropic_api_key: Option<String>,
    /// Whole IDR an order must settle for before a premium code is issued.
    pub premium_price: i64,
    pub premium_duration_hours: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            midtrans_server_key: require_env("MIDTRANS_SERVER_KEY")?,
            midtrans_client_key: require_env("MIDTRANS_CLIENT_KEY")?,
            midtrans_snap_url: env_or("MIDTRANS_SNAP_URL", "https://app.sandbox.midtrans.com"),
            midtrans_api_url: env_or("MIDTRANS_API_URL", "https://api.sandbox.midtrans.com"),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:5173"),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            premium_price: env_or("PREMIUM_PRICE", "19000")
                .parse::<i64>()
                .context("PREMIUM_PRICE must be a whole number")?,
            premium_duration_hours: env_or("PREMIUM_DURATION_HOURS", "24")
                .parse::<i64>()
                .context("PREMIUM_DURATION_HOURS must be a whole number")?,
            port: env_or("PORT", "3001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn premium_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.premium_duration_hours)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
pub mod testing {
    use super::Config;

    pub fn test_config() -> Config {
        Config {
            midtrans_server_key: "SB-Mid-server-test".to_string(),
            midtrans_client_key: "SB-Mid-client-test".to_string(),
            midtrans_snap_url: "https://app.sandbox.midtrans.com".to_string(),
            midtrans_api_url: "https://api.sandbox.midtrans.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            anthropic_api_key: None,
            premium_price: 19000,
            premium_duration_hours: 24,
            port: 3001,
            rust_log: "info".to_string(),
        }
    }
}
