//! Error types for the Polymarket client and the analysis engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Polymarket {endpoint} error {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to fetch trades for wallet {wallet}: {source}")]
    TradeFetch {
        wallet: String,
        #[source]
        source: ApiError,
    },

    #[error("Analysis of wallet {wallet} timed out")]
    Timeout { wallet: String },
}
