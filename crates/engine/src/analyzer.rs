//! Wallet Analyzer: fetch a wallet's trades, rebuild per-market PnL and score it
//!
//! Sequence for one wallet:
//! 1. resolve the time window
//! 2. fetch the wallet's trades (the only fatal step)
//! 3. fetch activity (kept as an extension point, not scored)
//! 4. group trades by market
//! 5. enrich each market with metadata, skipping unknown markets
//! 6. per-market PnL, then wallet metrics

use crate::aggregator::{aggregate_by_market, MarketAggregate};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::metrics::{compute_metrics, round_ratio, WalletMetrics};
use crate::pnl::EnrichedMarket;
use crate::source::{MarketDataSource, TradeQuery};
use crate::types::{MarketDetail, Trade, WalletAnalysis};
use crate::window::TimeRange;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Full-precision result of analyzing one wallet
#[derive(Debug, Clone)]
pub struct WalletEvaluation {
    pub wallet: String,
    pub markets: Vec<EnrichedMarket>,
    pub metrics: WalletMetrics,
}

impl WalletEvaluation {
    pub fn resolved_markets(&self) -> impl Iterator<Item = &EnrichedMarket> {
        self.markets.iter().filter(|m| m.is_resolved())
    }

    /// Largest single resolved stake as a fraction of total resolved stake.
    /// `None` when nothing was staked on resolved markets; saturates at
    /// `Decimal::MAX` when the quotient overflows.
    pub fn max_resolved_stake_weight(&self) -> Option<Decimal> {
        let total = self.metrics.resolved_stake;
        if total <= Decimal::ZERO {
            return None;
        }
        self.resolved_markets()
            .map(|m| m.stake())
            .max()
            .map(|largest| largest.checked_div(total).unwrap_or(Decimal::MAX))
    }

    /// Rounded presentation form
    pub fn to_analysis(&self) -> WalletAnalysis {
        let m = &self.metrics;
        WalletAnalysis {
            wallet: self.wallet.clone(),
            hit_rate: round_ratio(m.hit_rate),
            roi: round_ratio(m.roi),
            realized_pnl: m.realized_pnl.round_dp(2),
            total_volume_traded: m.total_volume.round_dp(2),
            last_trade_time: m.last_trade_time.and_then(to_datetime),
            trader_score: round_ratio(m.trader_score),
            resolved_markets: m.resolved_count,
            profitable_markets: m.profitable_count,
            markets: self.markets.iter().map(market_detail).collect(),
        }
    }
}

fn to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn market_detail(market: &EnrichedMarket) -> MarketDetail {
    let info = &market.info;
    MarketDetail {
        market_id: market.market_id().to_string(),
        title: info.title.clone(),
        category: info.category.clone(),
        resolved: info.resolved,
        outcome: info.outcome.clone(),
        stake: market.stake().round_dp(2),
        pnl: market.pnl.round_dp(2),
        entry_price: market.entry_price.round_dp(4),
        exit_price: market.exit_price.map(|p| p.round_dp(4)),
        resolved_at: if info.resolved {
            info.end_date.clone()
        } else {
            None
        },
        last_trade_time: market.last_trade_time.and_then(to_datetime),
    }
}

/// Per-wallet analysis over an injected data source
pub struct WalletAnalyzer<S> {
    source: Arc<S>,
    config: AnalyzerConfig,
}

impl<S> Clone for WalletAnalyzer<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: MarketDataSource> WalletAnalyzer<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_config(source, AnalyzerConfig::default())
    }

    pub fn with_config(source: Arc<S>, config: AnalyzerConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub async fn analyze(
        &self,
        wallet: &str,
        range: TimeRange,
    ) -> Result<WalletAnalysis, AnalysisError> {
        self.analyze_at(wallet, range, Utc::now()).await
    }

    /// Same as [`analyze`](Self::analyze) with an explicit clock
    pub async fn analyze_at(
        &self,
        wallet: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<WalletAnalysis, AnalysisError> {
        Ok(self.evaluate_at(wallet, range, now).await?.to_analysis())
    }

    pub async fn evaluate_at(
        &self,
        wallet: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<WalletEvaluation, AnalysisError> {
        info!(wallet, range = %range, "Analyzing wallet");
        let window = range.window(now);

        let query = TradeQuery::new(self.config.trade_limit)
            .maker(wallet)
            .between(window.start_ts, window.end_ts);
        let trades = self
            .source
            .fetch_trades(&query)
            .await
            .map_err(|source| AnalysisError::TradeFetch {
                wallet: wallet.to_string(),
                source,
            })?;
        info!(wallet, count = trades.len(), "Trades fetched");

        // Activity is fetched but not scored
        match self
            .source
            .fetch_activity(wallet, self.config.activity_limit, 0)
            .await
        {
            Ok(activity) => debug!(wallet, count = activity.len(), "Activity fetched"),
            Err(e) => warn!(wallet, error = %e, "Failed to fetch activity"),
        }

        let aggregates = aggregate_by_market(&trades);
        let markets = self.enrich(aggregates).await;
        let metrics = compute_metrics(&markets, &trades, now);

        Ok(WalletEvaluation {
            wallet: reported_wallet(wallet, &trades),
            markets,
            metrics,
        })
    }

    /// Join aggregates with market metadata. Lookups run concurrently but
    /// results keep the aggregate (market id) order.
    async fn enrich(
        &self,
        aggregates: impl IntoIterator<Item = (String, MarketAggregate)>,
    ) -> Vec<EnrichedMarket> {
        let concurrency = self.config.metadata_concurrency.max(1);
        stream::iter(aggregates)
            .map(|(market_id, aggregate)| async move {
                match self.source.fetch_market(&market_id).await {
                    Ok(Some(info)) => Some(EnrichedMarket::build(aggregate, info)),
                    Ok(None) => {
                        warn!(market_id = %market_id, "No metadata found for market");
                        None
                    }
                    Err(e) => {
                        warn!(market_id = %market_id, error = %e, "Failed to fetch market metadata");
                        None
                    }
                }
            })
            .buffered(concurrency)
            .filter_map(|market| async move { market })
            .collect()
            .await
    }
}

/// Maker address as reported by the platform, falling back to the input.
fn reported_wallet(wallet: &str, trades: &[Trade]) -> String {
    trades
        .first()
        .and_then(|t| t.maker.as_deref())
        .filter(|maker| !maker.is_empty())
        .unwrap_or(wallet)
        .to_string()
}
