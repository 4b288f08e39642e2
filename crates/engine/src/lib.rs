//! Polalfa Engine: wallet profitability analysis for Polymarket traders
//!
//! Provides:
//! - Polymarket Data/Gamma API client with a shared rate limiter
//! - Per-market trade aggregation and approximate realized PnL
//! - Hit rate, ROI, recency and composite trader score per wallet
//! - Leaderboard discovery and ranking of copy-worthy wallets

pub mod aggregator;
pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pnl;
pub mod ranking;
pub mod source;
pub mod types;
pub mod window;

// Re-exports for convenience
pub use analyzer::{WalletAnalyzer, WalletEvaluation};
pub use api::{PolymarketClient, RateLimiter};
pub use config::{AnalyzerConfig, ClientConfig, RankingConfig};
pub use error::{AnalysisError, ApiError, ApiResult};
pub use ranking::Leaderboard;
pub use source::{MarketDataSource, TradeQuery};
pub use types::*;
pub use window::{resolve_window, TimeRange, TimeWindow};
