//! Market Aggregator: group a wallet's trades by market and sum stake exposure

use crate::types::Trade;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// All of one wallet's trades on a single market
#[derive(Debug, Clone, PartialEq)]
pub struct MarketAggregate {
    pub market_id: String,
    /// Fetch order is preserved
    pub trades: Vec<Trade>,
    pub total_stake: Decimal,
}

impl MarketAggregate {
    pub fn new(market_id: impl Into<String>) -> Self {
        Self {
            market_id: market_id.into(),
            trades: Vec::new(),
            total_stake: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, trade: Trade) {
        self.total_stake += trade.stake();
        self.trades.push(trade);
    }

    /// Latest known trade timestamp on this market
    pub fn last_trade_time(&self) -> Option<i64> {
        self.trades.iter().filter_map(|t| t.timestamp).max()
    }
}

/// Fold trades into per-market aggregates keyed by market id.
///
/// Trades with no market id are dropped. Stake is a plain sum so the input
/// order does not change the totals.
pub fn aggregate_by_market(trades: &[Trade]) -> BTreeMap<String, MarketAggregate> {
    let mut markets: BTreeMap<String, MarketAggregate> = BTreeMap::new();
    let mut dropped = 0usize;

    for trade in trades {
        let Some(market_id) = trade.market_id.as_deref().filter(|id| !id.is_empty()) else {
            dropped += 1;
            continue;
        };
        markets
            .entry(market_id.to_string())
            .or_insert_with(|| MarketAggregate::new(market_id))
            .push(trade.clone());
    }

    if dropped > 0 {
        debug!(dropped, "Discarded trades without a market id");
    }
    markets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use rust_decimal_macros::dec;

    fn make_trade(market: Option<&str>, side: Side, size: Decimal, price: Decimal, ts: i64) -> Trade {
        Trade {
            id: None,
            market_id: market.map(Into::into),
            asset_id: "yes".into(),
            maker: Some("0xabc".into()),
            taker: None,
            side: Some(side),
            size,
            price: Some(price),
            timestamp: Some(ts),
        }
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_by_market(&[]).is_empty());
    }

    #[test]
    fn test_groups_and_sums_stake() {
        let trades = vec![
            make_trade(Some("m1"), Side::Buy, dec!(10), dec!(0.4), 1),
            make_trade(Some("m2"), Side::Buy, dec!(20), dec!(0.5), 2),
            make_trade(Some("m1"), Side::Sell, dec!(4), dec!(0.7), 3),
        ];
        let markets = aggregate_by_market(&trades);

        assert_eq!(markets.len(), 2);
        let m1 = &markets["m1"];
        assert_eq!(m1.trades.len(), 2);
        // 10 * 0.4 for the buy, plus the sold size
        assert_eq!(m1.total_stake, dec!(8));
        assert_eq!(m1.last_trade_time(), Some(3));
        assert_eq!(markets["m2"].total_stake, dec!(10));
    }

    #[test]
    fn test_drops_trades_without_market() {
        let trades = vec![
            make_trade(None, Side::Buy, dec!(10), dec!(0.4), 1),
            make_trade(Some(""), Side::Buy, dec!(10), dec!(0.4), 1),
            make_trade(Some("m1"), Side::Buy, dec!(1), dec!(0.5), 2),
        ];
        let markets = aggregate_by_market(&trades);
        assert_eq!(markets.len(), 1);
        assert_eq!(markets["m1"].trades.len(), 1);
    }

    #[test]
    fn test_order_independent_stake() {
        let mut trades = vec![
            make_trade(Some("m1"), Side::Buy, dec!(10), dec!(0.4), 1),
            make_trade(Some("m1"), Side::Sell, dec!(3), dec!(0.9), 2),
            make_trade(Some("m1"), Side::Buy, dec!(5), dec!(0.6), 3),
        ];
        let forward = aggregate_by_market(&trades)["m1"].total_stake;
        trades.reverse();
        let backward = aggregate_by_market(&trades)["m1"].total_stake;
        assert_eq!(forward, backward);
        assert_eq!(forward, dec!(10));
    }
}
