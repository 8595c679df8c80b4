use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::routes::{annotations, health, instruments, market};
use crate::state::AppState;

/// Assembles the full HTTP surface: the API under /api, a liveness probe,
/// CORS for the browser frontend, and the static chart assets as fallback.
pub fn create_app(state: AppState, static_dir: &str) -> Router {
    let api = Router::<AppState>::new()
        .merge(instruments::router())
        .merge(market::router())
        .merge(annotations::router());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
