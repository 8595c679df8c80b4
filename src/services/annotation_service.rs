use async_trait::async_trait;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::chart::session::{AnnotationStore, StoreError};
use crate::chart::timeutil::{self, TimeInput};
use crate::db::annotation_queries;
use crate::errors::AppError;
use crate::models::{Anchor, Annotation, WatchType};

/// Commit payload: two anchors in click order. Dates arrive in any of the
/// coordinate-mapper shapes (text, epoch, structured calendar).
#[derive(Debug, Deserialize)]
pub struct CommitPoints {
    pub point1: f64,
    pub date1: TimeInput,
    pub point2: f64,
    pub date2: TimeInput,
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Annotation>, AppError> {
    annotation_queries::get(pool, id).await.map_err(|e| {
        error!("Failed to fetch annotation for {}: {}", id, e);
        AppError::Db(e)
    })
}

/// Persists a two-point commit: refuses while locked, normalizes both dates
/// to the stored `YYYY-MM-DD HH:MM:SS` form, derives the watch type from the
/// click order, and upserts the row. Returns the changed-row count.
pub async fn commit(pool: &SqlitePool, id: &str, req: CommitPoints) -> Result<u64, AppError> {
    let existing = annotation_queries::get(pool, id).await?;
    if !WatchType::permits_drawing(existing.as_ref().and_then(Annotation::watch_type)) {
        return Err(AppError::Locked);
    }

    let date1 = timeutil::to_storage_datetime(&req.date1)?;
    let date2 = timeutil::to_storage_datetime(&req.date2)?;
    let watch = WatchType::derive(req.point1, req.point2);

    let changes = annotation_queries::upsert_points(
        pool, id, req.point1, &date1, req.point2, &date2, watch,
    )
    .await?;
    info!("Annotation committed for {} (watch_type {})", id, watch.as_i64());
    Ok(changes)
}

/// Sets the flag directly, decoupled from the stored points, so a locked
/// annotation can be unlocked without re-drawing.
pub async fn set_watch_type(
    pool: &SqlitePool,
    id: &str,
    watch: WatchType,
) -> Result<u64, AppError> {
    let changes = annotation_queries::set_watch_type(pool, id, watch).await?;
    info!("Watch type for {} set to {}", id, watch.as_i64());
    Ok(changes)
}

/// The sqlite-backed persistence gateway for chart sessions.
pub struct SqliteAnnotationStore {
    pool: SqlitePool,
}

impl SqliteAnnotationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnotationStore for SqliteAnnotationStore {
    async fn load(&self, id: &str) -> Result<Option<Annotation>, StoreError> {
        annotation_queries::get(&self.pool, id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn commit(
        &self,
        id: &str,
        first: Anchor,
        second: Anchor,
    ) -> Result<Annotation, StoreError> {
        let req = CommitPoints {
            point1: first.price,
            date1: first.date.into(),
            point2: second.price,
            date2: second.date.into(),
        };
        match commit(&self.pool, id, req).await {
            Ok(_) => {}
            Err(AppError::Locked) => return Err(StoreError::Locked),
            Err(e) => return Err(StoreError::Backend(e.to_string())),
        }
        annotation_queries::get(&self.pool, id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or_else(|| StoreError::Backend("row vanished after commit".into()))
    }

    async fn set_watch_type(&self, id: &str, watch: WatchType) -> Result<(), StoreError> {
        annotation_queries::set_watch_type(&self.pool, id, watch)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
