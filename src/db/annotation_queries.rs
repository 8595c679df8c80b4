use sqlx::SqlitePool;

use crate::models::{Annotation, WatchType};

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>(
        "SELECT id, point1, date1, point2, date2, watch_type FROM kline WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Writes both anchors and the derived watch type in one statement. Dates
/// must already be normalized to `YYYY-MM-DD HH:MM:SS`.
pub async fn upsert_points(
    pool: &SqlitePool,
    id: &str,
    point1: f64,
    date1: &str,
    point2: f64,
    date2: &str,
    watch_type: WatchType,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO kline (id, point1, date1, point2, date2, watch_type)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            point1 = excluded.point1,
            date1 = excluded.date1,
            point2 = excluded.point2,
            date2 = excluded.date2,
            watch_type = excluded.watch_type
        "#,
    )
    .bind(id)
    .bind(point1)
    .bind(date1)
    .bind(point2)
    .bind(date2)
    .bind(watch_type.as_i64())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Sets the flag without touching the points; creates the row if the
/// instrument has never been annotated.
pub async fn set_watch_type(
    pool: &SqlitePool,
    id: &str,
    watch_type: WatchType,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO kline (id, watch_type) VALUES (?, ?)
        ON CONFLICT (id) DO UPDATE SET watch_type = excluded.watch_type
        "#,
    )
    .bind(id)
    .bind(watch_type.as_i64())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM kline WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
