use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::external::bar_provider::{BarProvider, BarProviderError};
use crate::models::Bar;

pub const DEFAULT_STOCK_SYMBOL: &str = "SZ000001";

const KLINE_URL: &str =
    "https://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";

/// Daily A-share kline bars from the Sina market-data endpoint.
pub struct SinaProvider {
    client: reqwest::Client,
}

impl SinaProvider {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    /// Raw upstream payload, for the pass-through proxy route.
    pub async fn fetch_raw(&self, symbol: &str) -> Result<String, BarProviderError> {
        let resp = self
            .client
            .get(KLINE_URL)
            .query(&query_params(symbol))
            .send()
            .await
            .map_err(|e| BarProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BarProviderError::BadResponse(format!("status {}", resp.status())));
        }

        resp.text().await.map_err(|e| BarProviderError::Network(e.to_string()))
    }
}

impl Default for SinaProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn query_params(symbol: &str) -> [(&'static str, String); 4] {
    [
        ("symbol", symbol.to_string()),
        ("scale", "240".to_string()),
        ("ma", "5".to_string()),
        ("datalen", "300".to_string()),
    ]
}

// Upstream record; all numeric fields arrive as strings.
#[derive(Debug, Deserialize)]
pub struct RawStockBar {
    pub day: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

/// Drops records whose date or any OHLC field fails to parse to a positive
/// number, and returns the survivors ascending by date.
pub fn normalize_stock_records(records: Vec<RawStockBar>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = records
        .into_iter()
        .filter_map(|r| {
            let date = NaiveDate::parse_from_str(&r.day, "%Y-%m-%d").ok()?;
            let open = positive(&r.open)?;
            let high = positive(&r.high)?;
            let low = positive(&r.low)?;
            let close = positive(&r.close)?;
            Some(Bar::new(date, open, high, low, close))
        })
        .collect();
    bars.sort_by_key(|b| b.date);
    bars
}

fn positive(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| *v > 0.0)
}

#[async_trait]
impl BarProvider for SinaProvider {
    async fn fetch_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>, BarProviderError> {
        let body = self.fetch_raw(symbol).await?;
        let records: Vec<RawStockBar> =
            serde_json::from_str(&body).map_err(|e| BarProviderError::Parse(e.to_string()))?;
        Ok(normalize_stock_records(records))
    }
}
