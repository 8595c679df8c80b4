use sqlx::SqlitePool;

use crate::models::{Instrument, InstrumentKind};

// The stock and fund tables share a shape, so every query is written once
// against `kind.table()`. Table names come from a closed enum, never user
// input.

pub async fn list(pool: &SqlitePool, kind: InstrumentKind) -> Result<Vec<Instrument>, sqlx::Error> {
    let sql = format!("SELECT id, name FROM {} ORDER BY name ASC", kind.table());
    sqlx::query_as::<_, Instrument>(&sql).fetch_all(pool).await
}

pub async fn get(
    pool: &SqlitePool,
    kind: InstrumentKind,
    id: &str,
) -> Result<Option<Instrument>, sqlx::Error> {
    let sql = format!("SELECT id, name FROM {} WHERE id = ?", kind.table());
    sqlx::query_as::<_, Instrument>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &SqlitePool,
    kind: InstrumentKind,
    id: &str,
    name: &str,
) -> Result<(), sqlx::Error> {
    let sql = format!("INSERT INTO {} (id, name) VALUES (?, ?)", kind.table());
    sqlx::query(&sql).bind(id).bind(name).execute(pool).await?;
    Ok(())
}

/// Returns the number of renamed rows (0 when the id does not exist).
pub async fn rename(
    pool: &SqlitePool,
    kind: InstrumentKind,
    id: &str,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let sql = format!("UPDATE {} SET name = ? WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(name).bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn delete(
    pool: &SqlitePool,
    kind: InstrumentKind,
    id: &str,
) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
