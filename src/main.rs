use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;

use trendwatch::app;
use trendwatch::external::eastmoney::EastmoneyProvider;
use trendwatch::external::sina::SinaProvider;
use trendwatch::logging::{init_logging, LoggingConfig};
use trendwatch::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging(&LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://kline.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState {
        pool,
        stock_provider: Arc::new(SinaProvider::new()),
        fund_provider: Arc::new(EastmoneyProvider::new()),
    };

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string());
    let app = app::create_app(state, &static_dir);

    let port: u16 = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("trendwatch serving charts at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
