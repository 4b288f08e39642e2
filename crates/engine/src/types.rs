//! Domain types for wallet analysis

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a trade fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse the platform's side label. Anything other than BUY/SELL is unknown.
    pub fn parse(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("BUY") {
            Some(Self::Buy)
        } else if label.eq_ignore_ascii_case("SELL") {
            Some(Self::Sell)
        } else {
            None
        }
    }
}

/// A single trade fill, decoded from the Data API with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Option<String>,
    pub market_id: Option<String>,
    pub asset_id: String,
    pub maker: Option<String>,
    pub taker: Option<String>,
    pub side: Option<Side>,
    /// Absent sizes decode as zero
    pub size: Decimal,
    /// Kept optional: stake math treats a missing price as 0, volume math as 1
    pub price: Option<Decimal>,
    pub timestamp: Option<i64>,
}

impl Trade {
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    /// Capital committed by this fill: `size * price` for buys, the sold size otherwise.
    pub fn stake(&self) -> Decimal {
        match self.side {
            Some(Side::Buy) => self.size * self.price_or_zero(),
            _ => self.size,
        }
    }

    /// Traded notional, `size * price` with a missing price counted as 1.
    pub fn notional(&self) -> Decimal {
        self.size * self.price.unwrap_or(Decimal::ONE)
    }

    pub fn is_buy(&self) -> bool {
        self.side == Some(Side::Buy)
    }
}

/// An outcome token of a market (e.g. the YES share)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeToken {
    pub token_id: String,
    pub outcome: String,
}

/// Market metadata from the Gamma API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub market_id: String,
    pub title: String,
    pub category: String,
    pub resolved: bool,
    pub closed: bool,
    pub outcome: Option<String>,
    pub tokens: Vec<OutcomeToken>,
    pub end_date: Option<String>,
}

impl MarketInfo {
    /// Resolution outcome, only when the market is resolved and the outcome is known.
    pub fn settled_outcome(&self) -> Option<&str> {
        if self.resolved {
            self.outcome.as_deref()
        } else {
            None
        }
    }
}

/// On-chain activity event (trade, split, merge, redeem...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: Option<String>,
    pub market_id: Option<String>,
    pub asset_id: Option<String>,
    pub size: Option<Decimal>,
    pub usdc_size: Option<Decimal>,
    pub timestamp: Option<i64>,
    pub transaction_hash: Option<String>,
}

/// A top holder of a market's outcome token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderRecord {
    pub wallet: Option<String>,
    pub asset_id: Option<String>,
    pub amount: Option<Decimal>,
    pub outcome_index: Option<i64>,
}

// ---------------------------------------------------------------------------
// Presentation records
// ---------------------------------------------------------------------------

/// Per-market line of a wallet analysis, rounded for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDetail {
    pub market_id: String,
    pub title: String,
    pub category: String,
    pub resolved: bool,
    pub outcome: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub exit_price: Option<Decimal>,
    pub resolved_at: Option<String>,
    pub last_trade_time: Option<DateTime<Utc>>,
}

/// Full performance report for one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAnalysis {
    pub wallet: String,
    pub hit_rate: f64,
    pub roi: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_volume_traded: Decimal,
    pub last_trade_time: Option<DateTime<Utc>>,
    pub trader_score: f64,
    pub resolved_markets: usize,
    pub profitable_markets: usize,
    pub markets: Vec<MarketDetail>,
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopWallet {
    pub wallet: String,
    pub hit_rate: f64,
    pub roi: f64,
    pub trader_score: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_pnl: Decimal,
    pub resolved_markets: usize,
    pub last_trade_time: Option<DateTime<Utc>>,
}

impl From<&WalletAnalysis> for TopWallet {
    fn from(analysis: &WalletAnalysis) -> Self {
        Self {
            wallet: analysis.wallet.clone(),
            hit_rate: analysis.hit_rate,
            roi: analysis.roi,
            trader_score: analysis.trader_score,
            realized_pnl: analysis.realized_pnl,
            resolved_markets: analysis.resolved_markets,
            last_trade_time: analysis.last_trade_time,
        }
    }
}
