use async_trait::async_trait;
use thiserror::Error;

use crate::models::Bar;

/// Network, status, and decode failures are distinct so callers can tell
/// "no data" from "bad data".
#[derive(Debug, Error)]
pub enum BarProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Normalizes one upstream data shape into the common OHLC bar schema.
/// Output is ordered ascending by date; records missing required numeric
/// fields are dropped.
#[async_trait]
pub trait BarProvider: Send + Sync {
    async fn fetch_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>, BarProviderError>;
}
