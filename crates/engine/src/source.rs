//! The data-source seam between the engine and the remote platform

use crate::error::ApiResult;
use crate::types::{ActivityEvent, HolderRecord, MarketInfo, Trade};
use async_trait::async_trait;

/// Filters for a trade listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeQuery {
    pub market: Option<String>,
    pub maker: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

impl TradeQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn maker(mut self, maker: impl Into<String>) -> Self {
        self.maker = Some(maker.into());
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn between(mut self, start_ts: i64, end_ts: i64) -> Self {
        self.start_ts = Some(start_ts);
        self.end_ts = Some(end_ts);
        self
    }
}

/// Everything the analysis engine needs from the platform.
///
/// Implementations own connection pooling and rate limiting; the engine
/// calls through this trait and holds no shared state of its own.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_trades(&self, query: &TradeQuery) -> ApiResult<Vec<Trade>>;

    async fn fetch_activity(&self, user: &str, limit: u32, offset: u32)
        -> ApiResult<Vec<ActivityEvent>>;

    /// `Ok(None)` when the market does not exist
    async fn fetch_market(&self, market_id: &str) -> ApiResult<Option<MarketInfo>>;

    async fn fetch_holders(&self, market_id: &str, limit: u32) -> ApiResult<Vec<HolderRecord>>;

    async fn fetch_markets(
        &self,
        limit: u32,
        offset: u32,
        active: Option<bool>,
    ) -> ApiResult<Vec<MarketInfo>>;
}
