mod de;
pub mod polymarket;
pub mod rate_limit;

pub use polymarket::PolymarketClient;
pub use rate_limit::RateLimiter;
