//! Leaderboard Ranker: discover active wallets, analyze them and rank the copy-worthy ones
//!
//! 1. Pull one bounded slice of recent trades in the window.
//! 2. Sum committed volume per maker and shortlist the most active
//!    (oversampled, since filters drop many).
//! 3. Analyze each candidate; failures and timeouts drop only that candidate.
//! 4. Filter out thin, small or single-bet wallets.
//! 5. Sort by (trader_score, roi, hit_rate) descending and paginate.

use crate::analyzer::{WalletAnalyzer, WalletEvaluation};
use crate::config::RankingConfig;
use crate::error::AnalysisError;
use crate::source::{MarketDataSource, TradeQuery};
use crate::types::{Trade, WalletAnalysis};
use crate::window::TimeRange;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A wallet seen in the discovery slice, before full analysis
#[derive(Debug, Clone, PartialEq)]
pub struct RankingCandidate {
    pub wallet: String,
    pub volume: Decimal,
}

/// Why a candidate was kept off the leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRejection {
    TooFewResolvedMarkets,
    LowVolume,
    ConcentratedStake,
}

impl FilterRejection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TooFewResolvedMarkets => "too few resolved markets",
            Self::LowVolume => "volume below minimum",
            Self::ConcentratedStake => "single market dominates resolved stake",
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery, filters and ordering
// ---------------------------------------------------------------------------

/// Per-maker committed volume, most active first. Ties go to the lower address
/// so the shortlist is stable.
pub fn discover_candidates(trades: &[Trade]) -> Vec<RankingCandidate> {
    let mut volume_by_maker: HashMap<&str, Decimal> = HashMap::new();
    for trade in trades {
        let Some(maker) = trade.maker.as_deref().filter(|m| !m.is_empty()) else {
            continue;
        };
        *volume_by_maker.entry(maker).or_default() += trade.stake();
    }

    let mut candidates: Vec<RankingCandidate> = volume_by_maker
        .into_iter()
        .map(|(wallet, volume)| RankingCandidate {
            wallet: wallet.to_string(),
            volume,
        })
        .collect();
    candidates.sort_by(|a, b| b.volume.cmp(&a.volume).then_with(|| a.wallet.cmp(&b.wallet)));
    candidates
}

/// Noise filters applied to a fully analyzed candidate
pub fn check_filters(
    evaluation: &WalletEvaluation,
    config: &RankingConfig,
) -> Result<(), FilterRejection> {
    let metrics = &evaluation.metrics;
    if metrics.resolved_count < config.min_resolved_markets {
        return Err(FilterRejection::TooFewResolvedMarkets);
    }
    if metrics.total_volume < config.min_volume {
        return Err(FilterRejection::LowVolume);
    }
    if let Some(weight) = evaluation.max_resolved_stake_weight() {
        if weight > config.max_single_market_weight {
            return Err(FilterRejection::ConcentratedStake);
        }
    }
    Ok(())
}

/// Leaderboard order: trader_score, then roi, then hit_rate, all descending.
pub fn rank_order(a: &WalletAnalysis, b: &WalletAnalysis) -> Ordering {
    b.trader_score
        .total_cmp(&a.trader_score)
        .then_with(|| b.roi.total_cmp(&a.roi))
        .then_with(|| b.hit_rate.total_cmp(&a.hit_rate))
        .then_with(|| a.wallet.cmp(&b.wallet))
}

/// `[offset, offset + limit)`, empty when the offset is past the end
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Builds leaderboards on top of a [`WalletAnalyzer`]
pub struct Leaderboard<S> {
    analyzer: WalletAnalyzer<S>,
    config: RankingConfig,
}

impl<S: MarketDataSource> Leaderboard<S> {
    pub fn new(analyzer: WalletAnalyzer<S>) -> Self {
        Self::with_config(analyzer, RankingConfig::default())
    }

    pub fn with_config(analyzer: WalletAnalyzer<S>, config: RankingConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub async fn rank(&self, range: TimeRange, limit: usize, offset: usize) -> Vec<WalletAnalysis> {
        self.rank_at(range, limit, offset, Utc::now()).await
    }

    /// Same as [`rank`](Self::rank) with an explicit clock
    pub async fn rank_at(
        &self,
        range: TimeRange,
        limit: usize,
        offset: usize,
        now: DateTime<Utc>,
    ) -> Vec<WalletAnalysis> {
        info!(range = %range, limit, offset, "Ranking wallets");
        if limit == 0 {
            return Vec::new();
        }

        // Step 1: discovery slice
        let window = range.window(now);
        let query = TradeQuery::new(self.config.discovery_trade_limit)
            .between(window.start_ts, window.end_ts);
        let trade_slice = match self.analyzer.source().fetch_trades(&query).await {
            Ok(trades) => trades,
            Err(e) => {
                warn!(error = %e, "Failed to fetch discovery trades");
                return Vec::new();
            }
        };

        // Step 2: shortlist
        let shortlist_len = limit.saturating_mul(self.config.oversample_factor.max(1));
        let shortlist: Vec<RankingCandidate> = discover_candidates(&trade_slice)
            .into_iter()
            .take(shortlist_len)
            .collect();
        info!(
            trades = trade_slice.len(),
            candidates = shortlist.len(),
            "Evaluating candidate wallets"
        );

        // Step 3: analyze candidates
        let evaluations = self.evaluate_candidates(shortlist, range, now).await;

        // Step 4: filter, then order on the rounded values that get returned
        let mut ranked: Vec<WalletAnalysis> = evaluations
            .into_iter()
            .filter_map(|result| match result {
                Ok(evaluation) => Some(evaluation),
                Err(e) => {
                    warn!(error = %e, "Skipping wallet during ranking");
                    None
                }
            })
            .filter(|evaluation| match check_filters(evaluation, &self.config) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(wallet = %evaluation.wallet, reason = reason.label(), "Filtered out");
                    false
                }
            })
            .map(|evaluation| evaluation.to_analysis())
            .collect();
        ranked.sort_by(rank_order);
        info!(survivors = ranked.len(), "Ranking complete");

        paginate(ranked, offset, limit)
    }

    async fn evaluate_candidates(
        &self,
        candidates: Vec<RankingCandidate>,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Vec<Result<WalletEvaluation, AnalysisError>> {
        let timeout = self.config.candidate_timeout;
        let concurrency = self.config.candidate_concurrency.max(1);

        stream::iter(candidates)
            .map(|candidate| async move {
                let evaluation = self.analyzer.evaluate_at(&candidate.wallet, range, now);
                match tokio::time::timeout(timeout, evaluation).await {
                    Ok(result) => result,
                    Err(_) => Err(AnalysisError::Timeout {
                        wallet: candidate.wallet.clone(),
                    }),
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }
}
