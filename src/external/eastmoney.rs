use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::external::bar_provider::{BarProvider, BarProviderError};
use crate::models::Bar;

pub const DEFAULT_FUND_SYMBOL: &str = "270042";

const NAV_URL: &str = "https://fundmobapi.eastmoney.com/FundMNewApi/FundMNHisNetList";

/// Historical fund NAV records from the Eastmoney mobile API. Funds report a
/// single NAV per day, so OHLC is synthesized from the NAV and its daily
/// percent change.
pub struct EastmoneyProvider {
    client: reqwest::Client,
}

impl EastmoneyProvider {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    pub async fn fetch_raw(&self, symbol: &str) -> Result<String, BarProviderError> {
        let resp = self
            .client
            .get(NAV_URL)
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

impl Default for EastmoneyProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn query_params(symbol: &str) -> [(&'static str, String); 8] {
    [
        ("pageIndex", "1".to_string()),
        ("pageSize", "300".to_string()),
        ("plat", "Android".to_string()),
        ("appType", "ttjj".to_string()),
        ("product", "EFund".to_string()),
        ("Version", "1".to_string()),
        ("deviceid", "230874bd-c234-4e40-84f1-6a1a05fad7fb".to_string()),
        ("Fcode", symbol.to_string()),
    ]
}

#[derive(Debug, Deserialize)]
pub struct FundHistoryResponse {
    #[serde(rename = "Datas")]
    pub datas: Vec<RawFundRecord>,
}

/// Upstream NAV record, newest first. `FSRQ` is the valuation date, `DWJZ`
/// the unit NAV, `JZZZL` the day-over-day percent change.
#[derive(Debug, Deserialize)]
pub struct RawFundRecord {
    #[serde(rename = "FSRQ")]
    pub fsrq: Option<String>,
    #[serde(rename = "DWJZ")]
    pub dwjz: Option<String>,
    #[serde(rename = "JZZZL")]
    pub jzzzl: Option<String>,
}

/// Synthesizes OHLC from NAV records: close is the NAV, open backs out the
/// previous close from the percent change (`close / (1 + pct/100)`), high and
/// low bracket the two. Volume and turnover are fixed placeholders since
/// funds report no intraday trade data. Records missing any field are
/// dropped; output is reversed to ascending date order.
pub fn normalize_fund_records(records: Vec<RawFundRecord>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = records
        .into_iter()
        .filter_map(|r| {
            let date = NaiveDate::parse_from_str(r.fsrq.as_deref()?, "%Y-%m-%d").ok()?;
            let close: f64 = r.dwjz.as_deref()?.parse().ok()?;
            let percent: f64 = r.jzzzl.as_deref()?.parse().ok()?;
            let open = close / (1.0 + percent / 100.0);
            Some(Bar {
                date,
                open,
                high: close.max(open),
                low: close.min(open),
                close,
                volume: 0.0,
                turnover: 0.0,
            })
        })
        .collect();
    bars.reverse();
    bars
}

#[async_trait]
impl BarProvider for EastmoneyProvider {
    async fn fetch_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>, BarProviderError> {
        let body = self.fetch_raw(symbol).await?;
        let parsed: FundHistoryResponse =
            serde_json::from_str(&body).map_err(|e| BarProviderError::Parse(e.to_string()))?;
        Ok(normalize_fund_records(parsed.datas))
    }
}
