use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::{eastmoney, sina};
use crate::state::AppState;

// ==============================================================================
// Router - outbound data-fetch proxies
// ==============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock-data", get(stock_data))
        .route("/fund-data", get(fund_data))
}

#[derive(Debug, Deserialize)]
struct SymbolParams {
    symbol: Option<String>,
}

/// GET /api/stock-data?symbol=
///
/// Pass-through of the upstream daily kline payload; normalization happens
/// client-side against the raw records.
async fn stock_data(
    Query(params): Query<SymbolParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let symbol = params.symbol.unwrap_or_else(|| sina::DEFAULT_STOCK_SYMBOL.to_string());
    info!("GET /api/stock-data - proxying kline for {}", symbol);

    let body = state.stock_provider.fetch_raw(&symbol).await.map_err(|e| {
        error!("Failed to fetch stock data for {}: {}", symbol, e);
        AppError::from(e)
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// GET /api/fund-data?symbol=
///
/// Pass-through of the upstream `{Datas: [...]}` NAV payload.
async fn fund_data(
    Query(params): Query<SymbolParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let symbol = params.symbol.unwrap_or_else(|| eastmoney::DEFAULT_FUND_SYMBOL.to_string());
    info!("GET /api/fund-data - proxying NAV history for {}", symbol);

    let body = state.fund_provider.fetch_raw(&symbol).await.map_err(|e| {
        error!("Failed to fetch fund data for {}: {}", symbol, e);
        AppError::from(e)
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
