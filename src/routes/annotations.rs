use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{Annotation, WatchType};
use crate::services::annotation_service::{self, CommitPoints};
use crate::state::AppState;

// ==============================================================================
// Router - one annotation row per instrument id
// ==============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/kline/:id", get(get_annotation).put(put_annotation))
        .route("/kline/:id/watch-type", put(put_watch_type))
}

/// GET /api/kline/:id
///
/// The stored annotation row, or JSON `null` when the instrument has never
/// been annotated.
async fn get_annotation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Option<Annotation>>, AppError> {
    info!("GET /api/kline/{} - fetching annotation", id);
    let row = annotation_service::get(&state.pool, &id).await?;
    Ok(Json(row))
}

/// PUT /api/kline/:id
///
/// Commits both anchors in click order. The watch type is recomputed
/// server-side from the point order and dates are normalized to
/// `YYYY-MM-DD HH:MM:SS` before persisting. 409 while locked.
async fn put_annotation(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<CommitPoints>,
) -> Result<Json<u64>, AppError> {
    info!("PUT /api/kline/{} - committing annotation points", id);
    let changes = annotation_service::commit(&state.pool, &id, req).await?;
    Ok(Json(changes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatchTypeRequest {
    watch_type: WatchType,
}

#[derive(Debug, Serialize)]
struct WatchTypeResponse {
    success: bool,
    changes: u64,
}

/// PUT /api/kline/:id/watch-type
///
/// Sets the tri-state flag directly, independent of the stored points.
async fn put_watch_type(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<WatchTypeRequest>,
) -> Result<Json<WatchTypeResponse>, AppError> {
    info!("PUT /api/kline/{}/watch-type - setting {}", id, req.watch_type.as_i64());
    let changes = annotation_service::set_watch_type(&state.pool, &id, req.watch_type).await?;
    Ok(Json(WatchTypeResponse { success: true, changes }))
}
