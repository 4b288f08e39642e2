//! Polymarket client: public Data API and Gamma Markets API, no authentication
//!
//! Uses `data-api.polymarket.com` for trades, activity and holders, and
//! `gamma-api.polymarket.com` for market metadata. Every request goes through
//! a shared [`RateLimiter`].

use super::de;
use super::rate_limit::RateLimiter;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::source::{MarketDataSource, TradeQuery};
use crate::types::{ActivityEvent, HolderRecord, MarketInfo, OutcomeToken, Side, Trade};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Polymarket API client
#[derive(Clone)]
pub struct PolymarketClient {
    client: Client,
    config: Arc<ClientConfig>,
    limiter: Arc<RateLimiter>,
}

// ---------------------------------------------------------------------------
// Deserialization structs
// ---------------------------------------------------------------------------

/// Raw trade row. Field spellings differ between endpoint versions, so each
/// spelling gets its own slot and `From<ApiTrade>` picks the first present.
#[derive(Debug, Clone, Default, Deserialize)]
struct ApiTrade {
    #[serde(default, deserialize_with = "de::opt_label")]
    id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    market: Option<String>,
    #[serde(default, rename = "conditionId", deserialize_with = "de::opt_label")]
    condition_id_camel: Option<String>,
    #[serde(default, rename = "condition_id", deserialize_with = "de::opt_label")]
    condition_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    asset_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    asset: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    maker: Option<String>,
    #[serde(default, rename = "proxyWallet", deserialize_with = "de::opt_label")]
    proxy_wallet: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    taker: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    side: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    size: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    timestamp: Option<i64>,
}

impl From<ApiTrade> for Trade {
    fn from(raw: ApiTrade) -> Self {
        Trade {
            id: raw.id,
            market_id: raw.market.or(raw.condition_id_camel).or(raw.condition_id),
            asset_id: raw.asset_id.or(raw.asset).unwrap_or_default(),
            maker: raw.maker.or(raw.proxy_wallet),
            taker: raw.taker,
            side: raw.side.as_deref().and_then(Side::parse),
            size: raw.size.unwrap_or(Decimal::ZERO),
            price: raw.price,
            timestamp: raw.timestamp,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiToken {
    #[serde(default, deserialize_with = "de::opt_label")]
    token_id: Option<String>,
    #[serde(default, rename = "tokenId", deserialize_with = "de::opt_label")]
    token_id_camel: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    outcome: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApiMarket {
    #[serde(default, rename = "conditionId", deserialize_with = "de::opt_label")]
    condition_id_camel: Option<String>,
    #[serde(default, rename = "condition_id", deserialize_with = "de::opt_label")]
    condition_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    question: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    category: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    resolved: bool,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    closed: bool,
    #[serde(default, deserialize_with = "de::opt_label")]
    outcome: Option<String>,
    #[serde(default)]
    tokens: Option<Vec<ApiToken>>,
    #[serde(default, deserialize_with = "de::opt_label")]
    end_date_iso: Option<String>,
    #[serde(default, rename = "endDate", deserialize_with = "de::opt_label")]
    end_date: Option<String>,
}

impl ApiMarket {
    fn into_market_info(self, fallback_id: Option<&str>) -> MarketInfo {
        let market_id = fallback_id
            .map(str::to_string)
            .or(self.condition_id_camel)
            .or(self.condition_id)
            .or(self.id)
            .unwrap_or_default();
        let tokens = self
            .tokens
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                Some(OutcomeToken {
                    token_id: t.token_id.or(t.token_id_camel)?,
                    outcome: t.outcome.unwrap_or_default(),
                })
            })
            .collect();

        MarketInfo {
            market_id,
            title: self.question.unwrap_or_else(|| "Unknown Market".to_string()),
            category: self.category.unwrap_or_else(|| "uncategorized".to_string()),
            resolved: self.resolved,
            closed: self.closed,
            outcome: self.outcome,
            tokens,
            end_date: self.end_date_iso.or(self.end_date),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiActivity {
    #[serde(default, rename = "type", deserialize_with = "de::opt_label")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    condition_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    asset: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    size: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    usdc_size: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    timestamp: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_label")]
    transaction_hash: Option<String>,
}

impl From<ApiActivity> for ActivityEvent {
    fn from(raw: ApiActivity) -> Self {
        ActivityEvent {
            kind: raw.kind,
            market_id: raw.condition_id,
            asset_id: raw.asset,
            size: raw.size,
            usdc_size: raw.usdc_size,
            timestamp: raw.timestamp,
            transaction_hash: raw.transaction_hash,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHolder {
    #[serde(default, deserialize_with = "de::opt_label")]
    proxy_wallet: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    user: Option<String>,
    #[serde(default, deserialize_with = "de::opt_label")]
    asset: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    balance: Option<Decimal>,
    #[serde(default)]
    outcome_index: Option<i64>,
}

impl From<ApiHolder> for HolderRecord {
    fn from(raw: ApiHolder) -> Self {
        HolderRecord {
            wallet: raw.proxy_wallet.or(raw.user),
            asset_id: raw.asset,
            amount: raw.amount.or(raw.balance),
            outcome_index: raw.outcome_index,
        }
    }
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

impl Default for PolymarketClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PolymarketClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.http_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Rate-limited GET returning the JSON body, or `None` on 404.
    async fn get_json(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Option<Value>> {
        self.limiter.acquire().await;
        debug!(endpoint, url, "GET");

        let resp = self.client.get(url).query(query).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        let body: Value = resp.json().await?;
        Ok(Some(body))
    }

    /// List endpoints: anything other than a JSON array reads as empty.
    async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        match self.get_json(endpoint, url, query).await? {
            Some(body @ Value::Array(_)) => decode(endpoint, body),
            _ => Ok(Vec::new()),
        }
    }

    /// GET /trades: fills filtered by market, maker and time window
    pub async fn get_trades(&self, query: &TradeQuery) -> ApiResult<Vec<Trade>> {
        let url = format!("{}/trades", self.config.data_api_url);
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(market) = &query.market {
            params.push(("market", market.clone()));
        }
        if let Some(maker) = &query.maker {
            params.push(("maker", maker.clone()));
        }
        if let Some(start) = query.start_ts {
            params.push(("start_ts", start.to_string()));
        }
        if let Some(end) = query.end_ts {
            params.push(("end_ts", end.to_string()));
        }
        debug!(maker = ?query.maker, market = ?query.market, "Fetching trades");

        let raw: Vec<ApiTrade> = self.get_list("trades", &url, &params).await?;
        debug!(count = raw.len(), "Trades fetched");
        Ok(raw.into_iter().map(Trade::from).collect())
    }

    /// GET /activity?user={address}
    pub async fn get_activity(
        &self,
        user: &str,
        limit: u32,
        offset: u32,
    ) -> ApiResult<Vec<ActivityEvent>> {
        let url = format!("{}/activity", self.config.data_api_url);
        let params = [
            ("user", user.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        debug!(user, "Fetching activity");

        let raw: Vec<ApiActivity> = self.get_list("activity", &url, &params).await?;
        Ok(raw.into_iter().map(ActivityEvent::from).collect())
    }

    /// GET /markets/{id} on the Gamma API
    pub async fn get_market(&self, market_id: &str) -> ApiResult<Option<MarketInfo>> {
        let url = format!("{}/markets/{}", self.config.gamma_api_url, market_id);
        debug!(market_id, "Fetching market");

        let body = match self.get_json("market", &url, &[]).await? {
            // Some deployments answer with a one-element list
            Some(Value::Array(items)) => items.into_iter().next(),
            other => other,
        };
        match body {
            Some(body @ Value::Object(_)) => {
                let raw: ApiMarket = decode("market", body)?;
                Ok(Some(raw.into_market_info(Some(market_id))))
            }
            _ => Ok(None),
        }
    }

    /// GET /markets on the Gamma API
    pub async fn get_markets(
        &self,
        limit: u32,
        offset: u32,
        active: Option<bool>,
    ) -> ApiResult<Vec<MarketInfo>> {
        let url = format!("{}/markets", self.config.gamma_api_url);
        let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(active) = active {
            params.push(("active", active.to_string()));
        }
        debug!(limit, offset, "Fetching markets");

        let raw: Vec<ApiMarket> = self.get_list("markets", &url, &params).await?;
        Ok(raw.into_iter().map(|m| m.into_market_info(None)).collect())
    }

    /// GET /holders?market={id}
    pub async fn get_holders(&self, market_id: &str, limit: u32) -> ApiResult<Vec<HolderRecord>> {
        let url = format!("{}/holders", self.config.data_api_url);
        let params = [("market", market_id.to_string()), ("limit", limit.to_string())];
        debug!(market_id, "Fetching holders");

        let raw: Vec<ApiHolder> = self.get_list("holders", &url, &params).await?;
        Ok(raw.into_iter().map(HolderRecord::from).collect())
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl MarketDataSource for PolymarketClient {
    async fn fetch_trades(&self, query: &TradeQuery) -> ApiResult<Vec<Trade>> {
        self.get_trades(query).await
    }

    async fn fetch_activity(
        &self,
        user: &str,
        limit: u32,
        offset: u32,
    ) -> ApiResult<Vec<ActivityEvent>> {
        self.get_activity(user, limit, offset).await
    }

    async fn fetch_market(&self, market_id: &str) -> ApiResult<Option<MarketInfo>> {
        self.get_market(market_id).await
    }

    async fn fetch_holders(&self, market_id: &str, limit: u32) -> ApiResult<Vec<HolderRecord>> {
        self.get_holders(market_id, limit).await
    }

    async fn fetch_markets(
        &self,
        limit: u32,
        offset: u32,
        active: Option<bool>,
    ) -> ApiResult<Vec<MarketInfo>> {
        self.get_markets(limit, offset, active).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn decode_trades(json: &str) -> Vec<Trade> {
        let raw: Vec<ApiTrade> = serde_json::from_str(json).unwrap();
        raw.into_iter().map(Trade::from).collect()
    }

    #[test]
    fn test_trade_snake_case_fields() {
        let trades = decode_trades(
            r#"[{"id": "t1", "market": "0xcond", "asset_id": "tok-yes", "maker": "0xabc",
                "taker": "0xdef", "side": "BUY", "size": "10", "price": "0.4",
                "timestamp": 1700000000}]"#,
        );
        let t = &trades[0];
        assert_eq!(t.market_id.as_deref(), Some("0xcond"));
        assert_eq!(t.asset_id, "tok-yes");
        assert_eq!(t.maker.as_deref(), Some("0xabc"));
        assert_eq!(t.side, Some(Side::Buy));
        assert_eq!(t.size, dec!(10));
        assert_eq!(t.price, Some(dec!(0.4)));
        assert_eq!(t.timestamp, Some(1_700_000_000));
    }

    #[test]
    fn test_trade_data_api_camel_fields() {
        let trades = decode_trades(
            r#"[{"proxyWallet": "0xabc", "side": "SELL", "asset": "tok-no",
                "conditionId": "0xcond", "size": 5, "price": 0.62,
                "timestamp": "1700000000", "transactionHash": "0x1"}]"#,
        );
        let t = &trades[0];
        assert_eq!(t.market_id.as_deref(), Some("0xcond"));
        assert_eq!(t.asset_id, "tok-no");
        assert_eq!(t.maker.as_deref(), Some("0xabc"));
        assert_eq!(t.side, Some(Side::Sell));
        assert_eq!(t.price, Some(dec!(0.62)));
    }

    #[test]
    fn test_trade_malformed_fields_default() {
        let trades = decode_trades(r#"[{"side": "MERGE", "size": "n/a", "price": null}]"#);
        let t = &trades[0];
        assert_eq!(t.market_id, None);
        assert_eq!(t.side, None);
        assert_eq!(t.size, Decimal::ZERO);
        assert_eq!(t.price, None);
        assert_eq!(t.timestamp, None);
    }

    #[test]
    fn test_market_decoding() {
        let raw: ApiMarket = serde_json::from_str(
            r#"{"question": "Will BTC close above 100k?", "category": "crypto",
                "resolved": true, "closed": true, "outcome": "Yes",
                "tokens": [{"token_id": "tok-yes", "outcome": "Yes"},
                           {"tokenId": "tok-no", "outcome": "No"},
                           {"outcome": "orphan"}],
                "end_date_iso": "2024-05-31T00:00:00Z"}"#,
        )
        .unwrap();
        let info = raw.into_market_info(Some("0xcond"));

        assert_eq!(info.market_id, "0xcond");
        assert_eq!(info.title, "Will BTC close above 100k?");
        assert!(info.resolved);
        assert_eq!(info.settled_outcome(), Some("Yes"));
        assert_eq!(info.tokens.len(), 2);
        assert_eq!(info.tokens[1].token_id, "tok-no");
        assert_eq!(info.end_date.as_deref(), Some("2024-05-31T00:00:00Z"));
    }

    #[test]
    fn test_market_defaults() {
        let raw: ApiMarket = serde_json::from_str(r#"{"conditionId": "0xc", "tokens": null}"#).unwrap();
        let info = raw.into_market_info(None);
        assert_eq!(info.market_id, "0xc");
        assert_eq!(info.title, "Unknown Market");
        assert_eq!(info.category, "uncategorized");
        assert!(!info.resolved);
        assert!(info.tokens.is_empty());
    }

    #[test]
    fn test_activity_and_holders() {
        let raw: Vec<ApiActivity> = serde_json::from_str(
            r#"[{"type": "REDEEM", "conditionId": "0xc", "usdcSize": "15.5", "timestamp": 1700000000}]"#,
        )
        .unwrap();
        let event = ActivityEvent::from(raw[0].clone());
        assert_eq!(event.kind.as_deref(), Some("REDEEM"));
        assert_eq!(event.usdc_size, Some(dec!(15.5)));

        let raw: Vec<ApiHolder> =
            serde_json::from_str(r#"[{"user": "0xabc", "balance": 120, "outcomeIndex": 0}]"#).unwrap();
        let holder = HolderRecord::from(raw[0].clone());
        assert_eq!(holder.wallet.as_deref(), Some("0xabc"));
        assert_eq!(holder.amount, Some(dec!(120)));
    }

    #[test]
    fn test_decode_error_names_endpoint() {
        let err = decode::<ApiMarket>("market", Value::String("oops".into())).unwrap_err();
        assert!(err.to_string().contains("market"));
    }
}
