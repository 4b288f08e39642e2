//! Metrics Calculator: hit rate, ROI and the composite trader score

use crate::pnl::EnrichedMarket;
use crate::types::Trade;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const ROI_WEIGHT: f64 = 0.4;
const HIT_RATE_WEIGHT: f64 = 0.4;
const RECENCY_WEIGHT: f64 = 0.2;
/// Used when no trade carries a usable timestamp
const DEFAULT_RECENCY: f64 = 0.5;
const RECENCY_DECAY_DAYS: f64 = 7.0;

/// Aggregate wallet metrics at full precision
#[derive(Debug, Clone, PartialEq)]
pub struct WalletMetrics {
    pub resolved_count: usize,
    pub profitable_count: usize,
    pub hit_rate: f64,
    pub total_volume: Decimal,
    pub realized_pnl: Decimal,
    pub resolved_stake: Decimal,
    pub roi: f64,
    pub last_trade_time: Option<i64>,
    pub recency_score: f64,
    pub trader_score: f64,
}

/// ROI squashed into [-1, 1]; losses count at half weight before the floor.
pub fn normalized_roi(roi: f64) -> f64 {
    if roi > 0.0 {
        roi.min(1.0)
    } else {
        (roi / 2.0).max(-1.0)
    }
}

/// `e^(-days/7)` over whole days since the last trade.
pub fn recency_score(last_trade_time: Option<i64>, now: DateTime<Utc>) -> f64 {
    let Some(last) = last_trade_time.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)) else {
        return DEFAULT_RECENCY;
    };
    // Future timestamps count as today
    let days = (now - last).num_days().max(0) as f64;
    (-days / RECENCY_DECAY_DAYS).exp()
}

pub fn trader_score(roi: f64, hit_rate: f64, recency: f64) -> f64 {
    ROI_WEIGHT * normalized_roi(roi) + HIT_RATE_WEIGHT * hit_rate + RECENCY_WEIGHT * recency
}

/// Compute wallet metrics from its enriched markets and the full trade list.
///
/// Volume and recency use every trade, including ones on unresolved or
/// metadata-less markets. PnL, stake and hit rate use resolved markets only.
pub fn compute_metrics(
    markets: &[EnrichedMarket],
    all_trades: &[Trade],
    now: DateTime<Utc>,
) -> WalletMetrics {
    let resolved: Vec<&EnrichedMarket> = markets.iter().filter(|m| m.is_resolved()).collect();
    let resolved_count = resolved.len();
    let profitable_count = resolved.iter().filter(|m| m.pnl > Decimal::ZERO).count();

    let hit_rate = if resolved_count > 0 {
        profitable_count as f64 / resolved_count as f64
    } else {
        0.0
    };

    let total_volume: Decimal = all_trades.iter().map(Trade::notional).sum();
    let realized_pnl: Decimal = resolved.iter().map(|m| m.pnl).sum();
    let resolved_stake: Decimal = resolved.iter().map(|m| m.stake()).sum();

    let roi = if resolved_stake > Decimal::ZERO {
        ratio(realized_pnl, resolved_stake)
    } else {
        0.0
    };

    let last_trade_time = all_trades.iter().filter_map(|t| t.timestamp).max();
    let recency = recency_score(last_trade_time, now);

    WalletMetrics {
        resolved_count,
        profitable_count,
        hit_rate,
        total_volume,
        realized_pnl,
        resolved_stake,
        roi,
        last_trade_time,
        recency_score: recency,
        trader_score: trader_score(roi, hit_rate, recency),
    }
}

/// `numerator / denominator` as f64. Quotients too large for `Decimal` are
/// computed in f64 instead.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    match numerator.checked_div(denominator) {
        Some(quotient) => quotient.to_f64().unwrap_or(0.0),
        None => match (numerator.to_f64(), denominator.to_f64()) {
            (Some(n), Some(d)) if d != 0.0 => n / d,
            _ => 0.0,
        },
    }
}

/// Round a ratio for presentation (4 dp). Values outside `Decimal` range
/// pass through unrounded.
pub fn round_ratio(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .and_then(|d| d.round_dp(4).to_f64())
        .unwrap_or(value)
}
