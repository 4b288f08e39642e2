//! Position & PnL Engine: realized profit/loss per market from trade fills
//!
//! The model is an approximation built from observed fills, not ledger
//! settlement:
//! - net token position per asset, no cost-basis lot tracking
//! - winning tokens redeem at 1.0, everything else at 0
//! - net-short positions contribute no final value, so losses on shorts
//!   beyond the cash flow are not captured

use crate::aggregator::MarketAggregate;
use crate::types::{MarketInfo, OutcomeToken, Side, Trade};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A market aggregate joined with its metadata and computed results
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedMarket {
    pub aggregate: MarketAggregate,
    pub info: MarketInfo,
    pub pnl: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub last_trade_time: Option<i64>,
}

impl EnrichedMarket {
    /// PnL is only computed when the market resolved with a known outcome;
    /// otherwise it stays zero.
    pub fn build(aggregate: MarketAggregate, info: MarketInfo) -> Self {
        let pnl = match info.settled_outcome() {
            Some(outcome) => market_pnl(&aggregate.trades, outcome, &info.tokens),
            None => Decimal::ZERO,
        };
        let entry_price = entry_price(&aggregate.trades);
        let exit_price = exit_price(info.resolved, info.outcome.as_deref());
        let last_trade_time = aggregate.last_trade_time();

        Self {
            aggregate,
            info,
            pnl,
            entry_price,
            exit_price,
            last_trade_time,
        }
    }

    pub fn market_id(&self) -> &str {
        &self.aggregate.market_id
    }

    pub fn stake(&self) -> Decimal {
        self.aggregate.total_stake
    }

    pub fn is_resolved(&self) -> bool {
        self.info.resolved
    }
}

/// Token id that redeems at 1.0 for a YES/NO outcome label.
pub fn winning_token<'a>(outcome: &str, tokens: &'a [OutcomeToken]) -> Option<&'a str> {
    let label = outcome.trim();
    if !(label.eq_ignore_ascii_case("YES") || label.eq_ignore_ascii_case("NO")) {
        return None;
    }
    tokens
        .iter()
        .find(|t| t.outcome.trim().eq_ignore_ascii_case(label))
        .map(|t| t.token_id.as_str())
}

/// Realized PnL estimate: net cash flow plus redemption value of held winners.
pub fn market_pnl(trades: &[Trade], outcome: &str, tokens: &[OutcomeToken]) -> Decimal {
    let mut positions: HashMap<&str, Decimal> = HashMap::new();
    let mut cash_flow = Decimal::ZERO;

    for trade in trades {
        let cost = trade.size * trade.price_or_zero();
        match trade.side {
            Some(Side::Buy) => {
                *positions.entry(trade.asset_id.as_str()).or_default() += trade.size;
                cash_flow -= cost;
            }
            Some(Side::Sell) => {
                *positions.entry(trade.asset_id.as_str()).or_default() -= trade.size;
                cash_flow += cost;
            }
            None => {}
        }
    }

    let winner = winning_token(outcome, tokens);
    let final_value: Decimal = positions
        .iter()
        .filter(|(asset, position)| **position > Decimal::ZERO && Some(**asset) == winner)
        .map(|(_, position)| *position)
        .sum();

    cash_flow + final_value
}

/// Size-weighted average buy price, 0 when there are no buys.
pub fn entry_price(trades: &[Trade]) -> Decimal {
    let (size, weighted) = trades
        .iter()
        .filter(|t| t.is_buy())
        .fold((Decimal::ZERO, Decimal::ZERO), |(size, weighted), t| {
            (size + t.size, weighted + t.size * t.price_or_zero())
        });

    if size > Decimal::ZERO {
        weighted / size
    } else {
        Decimal::ZERO
    }
}

/// Settlement price implied by resolution; unknown while the market is open.
pub fn exit_price(resolved: bool, outcome: Option<&str>) -> Option<Decimal> {
    if !resolved {
        return None;
    }
    Some(if outcome.is_some() {
        Decimal::ONE
    } else {
        Decimal::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_trade(asset: &str, side: Side, size: Decimal, price: Decimal) -> Trade {
        Trade {
            id: None,
            market_id: Some("m1".into()),
            asset_id: asset.into(),
            maker: Some("0xabc".into()),
            taker: None,
            side: Some(side),
            size,
            price: Some(price),
            timestamp: Some(1_700_000_000),
        }
    }

    fn yes_no_tokens() -> Vec<OutcomeToken> {
        vec![
            OutcomeToken {
                token_id: "tok-yes".into(),
                outcome: "Yes".into(),
            },
            OutcomeToken {
                token_id: "tok-no".into(),
                outcome: "No".into(),
            },
        ]
    }

    #[test]
    fn test_winning_buys() {
        let trades = vec![
            make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.4)),
            make_trade("tok-yes", Side::Buy, dec!(5), dec!(0.6)),
        ];
        // cash flow -7, 15 tokens redeem at 1.0
        assert_eq!(market_pnl(&trades, "YES", &yes_no_tokens()), dec!(8));
        assert_eq!(entry_price(&trades).round_dp(4), dec!(0.4667));
    }

    #[test]
    fn test_losing_buys() {
        let trades = vec![make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.4))];
        assert_eq!(market_pnl(&trades, "no", &yes_no_tokens()), dec!(-4));
    }

    #[test]
    fn test_round_trip_before_resolution() {
        let trades = vec![
            make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.4)),
            make_trade("tok-yes", Side::Sell, dec!(10), dec!(0.7)),
        ];
        // Flat position, PnL is the realized spread
        assert_eq!(market_pnl(&trades, "YES", &yes_no_tokens()), dec!(3));
    }

    #[test]
    fn test_unmapped_outcome_is_pure_cash_flow() {
        let trades = vec![make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.4))];
        assert_eq!(winning_token("tok-yes", &yes_no_tokens()), None);
        assert_eq!(market_pnl(&trades, "tok-yes", &yes_no_tokens()), dec!(-4));
    }

    #[test]
    fn test_short_position_not_penalized() {
        // Sold tokens never bought: the short on the winner adds no negative value
        let trades = vec![make_trade("tok-yes", Side::Sell, dec!(10), dec!(0.3))];
        assert_eq!(market_pnl(&trades, "YES", &yes_no_tokens()), dec!(3));
    }

    #[test]
    fn test_unknown_side_ignored() {
        let mut trade = make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.4));
        trade.side = None;
        assert_eq!(market_pnl(&[trade], "YES", &yes_no_tokens()), Decimal::ZERO);
    }

    #[test]
    fn test_entry_price_ignores_sells() {
        let trades = vec![
            make_trade("tok-yes", Side::Sell, dec!(100), dec!(0.9)),
            make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.2)),
        ];
        assert_eq!(entry_price(&trades), dec!(0.2));
        assert_eq!(entry_price(&trades[..1]), Decimal::ZERO);
    }

    #[test]
    fn test_exit_price() {
        assert_eq!(exit_price(false, Some("YES")), None);
        assert_eq!(exit_price(true, Some("YES")), Some(Decimal::ONE));
        assert_eq!(exit_price(true, None), Some(Decimal::ZERO));
    }

    #[test]
    fn test_build_skips_pnl_when_unresolved() {
        let mut aggregate = MarketAggregate::new("m1");
        aggregate.push(make_trade("tok-yes", Side::Buy, dec!(10), dec!(0.4)));
        let info = MarketInfo {
            market_id: "m1".into(),
            title: "Test Market".into(),
            category: "politics".into(),
            resolved: false,
            closed: false,
            outcome: Some("YES".into()),
            tokens: yes_no_tokens(),
            end_date: None,
        };
        let market = EnrichedMarket::build(aggregate, info);
        assert_eq!(market.pnl, Decimal::ZERO);
        assert_eq!(market.exit_price, None);
        assert_eq!(market.entry_price, dec!(0.4));
        assert_eq!(market.last_trade_time, Some(1_700_000_000));
    }
}
