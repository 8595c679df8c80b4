use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::info;

use crate::db::instrument_queries;
use crate::errors::AppError;
use crate::models::{CreateInstrument, Instrument, InstrumentKind, UpdateInstrument};
use crate::state::AppState;

// ==============================================================================
// Router - stock and fund lists share one handler set
// ==============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(list_stocks).post(create_stock))
        .route("/stocks/:id", put(update_stock).delete(delete_stock))
        .route("/funds", get(list_funds).post(create_fund))
        .route("/funds/:id", put(update_fund).delete(delete_fund))
}

async fn list_stocks(State(state): State<AppState>) -> Result<Json<Vec<Instrument>>, AppError> {
    list(&state, InstrumentKind::Stock).await
}

async fn list_funds(State(state): State<AppState>) -> Result<Json<Vec<Instrument>>, AppError> {
    list(&state, InstrumentKind::Fund).await
}

async fn create_stock(
    State(state): State<AppState>,
    Json(req): Json<CreateInstrument>,
) -> Result<Json<String>, AppError> {
    create(&state, InstrumentKind::Stock, req).await
}

async fn create_fund(
    State(state): State<AppState>,
    Json(req): Json<CreateInstrument>,
) -> Result<Json<String>, AppError> {
    create(&state, InstrumentKind::Fund, req).await
}

async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateInstrument>,
) -> Result<Json<u64>, AppError> {
    update(&state, InstrumentKind::Stock, &id, req).await
}

async fn update_fund(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateInstrument>,
) -> Result<Json<u64>, AppError> {
    update(&state, InstrumentKind::Fund, &id, req).await
}

async fn delete_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<u64>, AppError> {
    remove(&state, InstrumentKind::Stock, &id).await
}

async fn delete_fund(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<u64>, AppError> {
    remove(&state, InstrumentKind::Fund, &id).await
}

// ==============================================================================
// Shared handler bodies
// ==============================================================================

async fn list(state: &AppState, kind: InstrumentKind) -> Result<Json<Vec<Instrument>>, AppError> {
    let items = instrument_queries::list(&state.pool, kind).await?;
    Ok(Json(items))
}

async fn create(
    state: &AppState,
    kind: InstrumentKind,
    req: CreateInstrument,
) -> Result<Json<String>, AppError> {
    if req.id.trim().is_empty() {
        return Err(AppError::Validation("instrument id must not be empty".into()));
    }
    instrument_queries::insert(&state.pool, kind, &req.id, &req.name).await?;
    info!("Created {:?} {} ({})", kind, req.id, req.name);
    Ok(Json(req.id))
}

async fn update(
    state: &AppState,
    kind: InstrumentKind,
    id: &str,
    req: UpdateInstrument,
) -> Result<Json<u64>, AppError> {
    let changes = instrument_queries::rename(&state.pool, kind, id, &req.name).await?;
    if changes == 0 {
        return Err(AppError::NotFound);
    }
    Ok(Json(changes))
}

async fn remove(state: &AppState, kind: InstrumentKind, id: &str) -> Result<Json<u64>, AppError> {
    let changes = instrument_queries::delete(&state.pool, kind, id).await?;
    if changes == 0 {
        return Err(AppError::NotFound);
    }
    info!("Deleted {:?} {}", kind, id);
    Ok(Json(changes))
}
