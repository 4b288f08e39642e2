//! Runtime configuration for the client, analyzer and leaderboard ranker

use rust_decimal::Decimal;
use std::time::Duration;

pub const DATA_API_URL: &str = "https://data-api.polymarket.com";
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub data_api_url: String,
    pub gamma_api_url: String,
    /// Minimum spacing between outgoing requests. The public API allows
    /// roughly 100 requests per minute per IP.
    pub rate_limit: Duration,
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_api_url: DATA_API_URL.to_string(),
            gamma_api_url: GAMMA_API_URL.to_string(),
            rate_limit: Duration::from_millis(600),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `POLALFA_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("POLALFA_DATA_API_URL") {
            config.data_api_url = url;
        }
        if let Ok(url) = std::env::var("POLALFA_GAMMA_API_URL") {
            config.gamma_api_url = url;
        }
        if let Some(ms) = env_u64("POLALFA_RATE_LIMIT_MS") {
            config.rate_limit = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("POLALFA_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(secs);
        }
        config
    }
}

pub fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Per-wallet analysis settings
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub trade_limit: u32,
    pub activity_limit: u32,
    /// Concurrent market metadata lookups per wallet
    pub metadata_concurrency: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            trade_limit: 1000,
            activity_limit: 1000,
            metadata_concurrency: 4,
        }
    }
}

/// Leaderboard discovery and noise filters
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub min_resolved_markets: usize,
    pub min_volume: Decimal,
    /// A wallet is dropped when one resolved market holds more than this
    /// fraction of its resolved stake
    pub max_single_market_weight: Decimal,
    pub discovery_trade_limit: u32,
    pub oversample_factor: usize,
    pub candidate_concurrency: usize,
    pub candidate_timeout: Duration,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_resolved_markets: 3,
            min_volume: Decimal::from(50),
            max_single_market_weight: Decimal::new(6, 1),
            discovery_trade_limit: 1000,
            oversample_factor: 3,
            candidate_concurrency: 4,
            candidate_timeout: Duration::from_secs(60),
        }
    }
}
