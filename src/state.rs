use std::sync::Arc;
use sqlx::SqlitePool;

use crate::external::eastmoney::EastmoneyProvider;
use crate::external::sina::SinaProvider;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub stock_provider: Arc<SinaProvider>,
    pub fund_provider: Arc<EastmoneyProvider>,
}
