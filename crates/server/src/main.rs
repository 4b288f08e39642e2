//! PolAlfa: Polymarket wallet profitability service
//!
//! Usage:
//!   polalfa serve --port 8000                 # Launch the HTTP API
//!   polalfa analyze 0xabc 0xdef --range 30d   # Analyze wallets from CLI
//!   polalfa rank --range 7d --limit 20        # Print the wallet leaderboard
//!   polalfa markets --limit 10 --active true  # List Gamma markets
//!   polalfa holders <market_id>               # List top holders of a market

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use engine::config::env_u64;
use engine::{
    ClientConfig, Leaderboard, PolymarketClient, TimeRange, TopWallet, WalletAnalysis,
    WalletAnalyzer,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));
const SERVICE_NAME: &str = "PolAlfa API";

const MAX_WALLETS_PER_REQUEST: usize = 10;
const MAX_TOP_WALLETS: i64 = 100;
const DEFAULT_TOP_WALLETS: i64 = 50;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Parser)]
#[command(name = "polalfa")]
#[command(about = "Analyze Polymarket traders and rank wallets by profitability", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
    /// Analyze one or more wallets and print the results as JSON
    Analyze {
        /// Wallet addresses
        #[arg(required = true)]
        wallets: Vec<String>,
        /// Time range: 7d, 30d, 90d
        #[arg(long, default_value = "30d")]
        range: TimeRange,
    },
    /// Discover and rank the top wallets for a time range
    Rank {
        /// Time range: 7d, 30d, 90d
        #[arg(long, default_value = "30d")]
        range: TimeRange,
        /// Number of wallets to return
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Number of ranked wallets to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// List markets from the Gamma API
    Markets {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Only active (true) or inactive (false) markets
        #[arg(long)]
        active: Option<bool>,
    },
    /// List the top holders of a market
    Holders {
        market_id: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Clone)]
struct AppState {
    analyzer: WalletAnalyzer<PolymarketClient>,
    leaderboard: Arc<Leaderboard<PolymarketClient>>,
    request_timeout: Duration,
}

impl AppState {
    fn from_env() -> Self {
        let client = Arc::new(PolymarketClient::with_config(ClientConfig::from_env()));
        let analyzer = WalletAnalyzer::new(client);
        let request_timeout = Duration::from_secs(
            env_u64("POLALFA_REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );
        Self {
            leaderboard: Arc::new(Leaderboard::new(analyzer.clone())),
            analyzer,
            request_timeout,
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,polalfa=debug")
    } else {
        EnvFilter::new("info,engine=info,polalfa=info")
    };

    // stdout is reserved for JSON output of the one-shot commands
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&host, port).await?;
        }
        Commands::Analyze { wallets, range } => {
            cmd_analyze(wallets, range).await?;
        }
        Commands::Rank {
            range,
            limit,
            offset,
        } => {
            cmd_rank(range, limit, offset).await?;
        }
        Commands::Markets {
            limit,
            offset,
            active,
        } => {
            cmd_markets(limit, offset, active).await?;
        }
        Commands::Holders { market_id, limit } => {
            cmd_holders(&market_id, limit).await?;
        }
    }

    Ok(())
}

// ============================================================================
// Serve command (Axum web server)
// ============================================================================

async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    info!("PolAlfa v{} starting...", APP_VERSION);

    let state = AppState::from_env();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(api_root))
        .route("/health", get(api_health))
        .route("/api/analyze-wallets", post(api_analyze_wallets))
        .route("/api/top-wallets", get(api_top_wallets))
        .with_state(state.clone())
        .layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== PolAlfa v{} ===", APP_VERSION);
    println!("Wallet Analysis Server");
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /                    - Service banner");
    println!("  GET  /health              - Health check");
    println!("  POST /api/analyze-wallets - Analyze up to {} wallets", MAX_WALLETS_PER_REQUEST);
    println!("  GET  /api/top-wallets     - Ranked wallet leaderboard");
    println!("\n  Request timeout: {}s", state.request_timeout.as_secs());
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// One-shot commands, JSON to stdout
// ============================================================================

async fn cmd_analyze(wallets: Vec<String>, range: TimeRange) -> anyhow::Result<()> {
    let state = AppState::from_env();
    let results = analyze_all(&state.analyzer, &wallets, range).await;
    print_json(&AnalyzeWalletsResponse {
        range,
        wallets: results,
    })
}

async fn cmd_rank(range: TimeRange, limit: usize, offset: usize) -> anyhow::Result<()> {
    let state = AppState::from_env();
    let ranked = state.leaderboard.rank(range, limit, offset).await;
    print_json(&TopWalletsResponse {
        range,
        wallets: ranked.iter().map(TopWallet::from).collect(),
    })
}

async fn cmd_markets(limit: u32, offset: u32, active: Option<bool>) -> anyhow::Result<()> {
    let client = PolymarketClient::with_config(ClientConfig::from_env());
    let markets = client.get_markets(limit, offset, active).await?;
    info!("Fetched {} markets", markets.len());
    print_json(&markets)
}

async fn cmd_holders(market_id: &str, limit: u32) -> anyhow::Result<()> {
    let client = PolymarketClient::with_config(ClientConfig::from_env());
    let holders = client.get_holders(market_id, limit).await?;
    info!("Fetched {} holders for market {}", holders.len(), market_id);
    print_json(&holders)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Analyze wallets one after another. Failed wallets are logged and skipped;
/// results come back best trader_score first.
async fn analyze_all(
    analyzer: &WalletAnalyzer<PolymarketClient>,
    wallets: &[String],
    range: TimeRange,
) -> Vec<WalletAnalysis> {
    let mut results = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        match analyzer.analyze(wallet.trim(), range).await {
            Ok(analysis) => results.push(analysis),
            Err(e) => error!("Error analyzing wallet {}: {}", wallet, e),
        }
    }
    results.sort_by(|a, b| b.trader_score.total_cmp(&a.trader_score));
    results
}

// ============================================================================
// API types and errors
// ============================================================================

#[derive(Deserialize)]
struct AnalyzeWalletsRequest {
    wallets: Vec<String>,
    range: String,
}

#[derive(Serialize)]
struct AnalyzeWalletsResponse {
    range: TimeRange,
    wallets: Vec<WalletAnalysis>,
}

#[derive(Serialize)]
struct TopWalletsResponse {
    range: TimeRange,
    wallets: Vec<TopWallet>,
}

/// Error response rendered as `{"detail": ...}`
#[derive(Debug, PartialEq)]
struct ApiFailure {
    status: StatusCode,
    detail: String,
}

impl ApiFailure {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn timeout() -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            detail: "Request timed out".to_string(),
        }
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: format!("Internal server error: {}", detail),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// Run request work on its own task under the request timeout. The task is
/// aborted on timeout so in-flight upstream calls are dropped.
async fn run_bounded<T, F>(timeout: Duration, work: F) -> Result<T, ApiFailure>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::spawn(work);
    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("Request task failed: {}", e);
            Err(ApiFailure::internal(e))
        }
        Err(_) => {
            handle.abort();
            warn!("Request timed out after {}s", timeout.as_secs());
            Err(ApiFailure::timeout())
        }
    }
}

/// Validates an analyze request, returning trimmed addresses and the range.
fn validate_analyze_request(
    request: &AnalyzeWalletsRequest,
) -> Result<(Vec<String>, TimeRange), ApiFailure> {
    if request.wallets.is_empty() {
        return Err(ApiFailure::bad_request("No wallets provided"));
    }
    if request.wallets.len() > MAX_WALLETS_PER_REQUEST {
        return Err(ApiFailure::bad_request(format!(
            "Maximum {} wallets allowed per request",
            MAX_WALLETS_PER_REQUEST
        )));
    }
    let range: TimeRange = request.range.parse().map_err(ApiFailure::bad_request)?;
    let wallets = request
        .wallets
        .iter()
        .map(|w| w.trim().to_string())
        .collect();
    Ok((wallets, range))
}

/// `range` (default 30d), `limit` in 1..=100 (default 50), `offset` >= 0
fn parse_top_wallets_query(
    params: &HashMap<String, String>,
) -> Result<(TimeRange, usize, usize), ApiFailure> {
    let range: TimeRange = params
        .get("range")
        .map(String::as_str)
        .unwrap_or("30d")
        .parse()
        .map_err(ApiFailure::bad_request)?;

    let limit = parse_int(params, "limit", DEFAULT_TOP_WALLETS)?;
    if !(1..=MAX_TOP_WALLETS).contains(&limit) {
        return Err(ApiFailure::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_TOP_WALLETS
        )));
    }
    let offset = parse_int(params, "offset", 0)?;
    if offset < 0 {
        return Err(ApiFailure::bad_request("offset must be >= 0"));
    }

    Ok((range, limit as usize, offset as usize))
}

fn parse_int(params: &HashMap<String, String>, key: &str, default: i64) -> Result<i64, ApiFailure> {
    match params.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiFailure::bad_request(format!("{} must be an integer", key))),
        None => Ok(default),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /
async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "status": "running",
        "version": APP_VERSION,
    }))
}

/// GET /health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// POST /api/analyze-wallets: analyze up to 10 wallets
async fn api_analyze_wallets(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeWalletsRequest>,
) -> Result<Json<AnalyzeWalletsResponse>, ApiFailure> {
    let (wallets, range) = validate_analyze_request(&request)?;
    info!("Analyzing {} wallets for range {}", wallets.len(), range);

    let analyzer = state.analyzer.clone();
    let results = run_bounded(state.request_timeout, async move {
        analyze_all(&analyzer, &wallets, range).await
    })
    .await?;

    Ok(Json(AnalyzeWalletsResponse {
        range,
        wallets: results,
    }))
}

/// GET /api/top-wallets: ranked leaderboard for a time range
async fn api_top_wallets(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TopWalletsResponse>, ApiFailure> {
    let (range, limit, offset) = parse_top_wallets_query(&params)?;
    info!(
        "Ranking top wallets for range {} with limit {} offset {}",
        range, limit, offset
    );

    let leaderboard = state.leaderboard.clone();
    let ranked = run_bounded(state.request_timeout, async move {
        leaderboard.rank(range, limit, offset).await
    })
    .await?;

    Ok(Json(TopWalletsResponse {
        range,
        wallets: ranked.iter().map(TopWallet::from).collect(),
    }))
}
