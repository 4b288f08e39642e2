//! Symbolic time ranges ("7d", "30d", "90d") and their concrete windows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
}

/// Inclusive `[start_ts, end_ts]` interval in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ts: i64,
    pub end_ts: i64,
}

impl TimeRange {
    /// Permissive parse: anything unrecognized falls back to 30 days.
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or(Self::ThirtyDays)
    }

    pub fn days(&self) -> i64 {
        match self {
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
            Self::NinetyDays => 90,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
            Self::NinetyDays => "90d",
        }
    }

    /// Window ending at `now`
    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        let end_ts = now.timestamp();
        TimeWindow {
            start_ts: end_ts - self.days() * SECONDS_PER_DAY,
            end_ts,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Strict parse, for validating user input
impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::SevenDays),
            "30d" => Ok(Self::ThirtyDays),
            "90d" => Ok(Self::NinetyDays),
            other => Err(format!(
                "Invalid range '{}'. Must be '7d', '30d', or '90d'",
                other
            )),
        }
    }
}

/// Resolve a range token to a concrete window ending at `now`.
pub fn resolve_window(token: &str, now: DateTime<Utc>) -> TimeWindow {
    TimeRange::from_token(token).window(now)
}
