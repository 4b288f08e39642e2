//! Lenient field decoders for the loosely typed Polymarket JSON.
//!
//! Numbers arrive as JSON numbers or strings depending on the endpoint, and a
//! malformed value must never fail the whole response, so every decoder here
//! maps garbage to `None`.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(&s),
        _ => None,
    })
}

/// Unix seconds from an integer, float, numeric string or RFC 3339 string.
/// Zero counts as missing.
pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let ts = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp()))
        }
        _ => None,
    };
    Ok(ts.filter(|ts| *ts != 0))
}

/// A label that may be sent as a string, number or bool. Empty, null and
/// `false` count as missing.
pub fn opt_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

/// Bool that tolerates `"true"`/`"false"` strings and null.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_decimal")]
        amount: Option<Decimal>,
        #[serde(default, deserialize_with = "opt_timestamp")]
        ts: Option<i64>,
        #[serde(default, deserialize_with = "opt_label")]
        label: Option<String>,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: bool,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decimal_forms() {
        assert_eq!(probe(r#"{"amount": 0.45}"#).amount, Some(dec!(0.45)));
        assert_eq!(probe(r#"{"amount": "12.5"}"#).amount, Some(dec!(12.5)));
        assert_eq!(probe(r#"{"amount": "abc"}"#).amount, None);
        assert_eq!(probe(r#"{"amount": null}"#).amount, None);
        assert_eq!(probe(r#"{}"#).amount, None);
    }

    #[test]
    fn test_timestamp_forms() {
        assert_eq!(probe(r#"{"ts": 1700000000}"#).ts, Some(1_700_000_000));
        assert_eq!(probe(r#"{"ts": "1700000000"}"#).ts, Some(1_700_000_000));
        assert_eq!(probe(r#"{"ts": 1700000000.7}"#).ts, Some(1_700_000_000));
        assert_eq!(
            probe(r#"{"ts": "2023-11-14T22:13:20Z"}"#).ts,
            Some(1_700_000_000)
        );
        assert_eq!(probe(r#"{"ts": "yesterday"}"#).ts, None);
        assert_eq!(probe(r#"{"ts": 0}"#).ts, None);
    }

    #[test]
    fn test_label_and_bool_forms() {
        assert_eq!(probe(r#"{"label": "YES"}"#).label.as_deref(), Some("YES"));
        assert_eq!(probe(r#"{"label": ""}"#).label, None);
        assert_eq!(probe(r#"{"label": 1}"#).label.as_deref(), Some("1"));
        assert_eq!(probe(r#"{"label": false}"#).label, None);
        assert!(probe(r#"{"flag": "true"}"#).flag);
        assert!(!probe(r#"{"flag": null}"#).flag);
    }
}
