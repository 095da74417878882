use sqlx::{Pool, Sqlite};

use crate::storage::errors::StorageError;

use super::SessionRow;

pub(super) async fn create_table_sqlite(
    pool: &Pool<Sqlite>,
    table: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY NOT NULL,
            payload TEXT NOT NULL,
            last_activity INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{table}_last_activity ON {table}(last_activity)
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn read_sqlite(
    pool: &Pool<Sqlite>,
    table: &str,
    id: &str,
    now: i64,
) -> Result<Option<String>, StorageError> {
    let payload: Option<(String,)> = sqlx::query_as(&format!(
        r#"
        SELECT payload FROM {table} WHERE id = ? AND expires_at > ?
        "#
    ))
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(payload.map(|(p,)| p))
}

pub(super) async fn upsert_sqlite(
    pool: &Pool<Sqlite>,
    table: &str,
    row: &SessionRow<'_>,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {table} (id, payload, last_activity, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            payload = excluded.payload,
            last_activity = excluded.last_activity,
            expires_at = excluded.expires_at
        "#
    ))
    .bind(row.id)
    .bind(row.payload)
    .bind(row.last_activity)
    .bind(row.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn insert_if_absent_sqlite(
    pool: &Pool<Sqlite>,
    table: &str,
    row: &SessionRow<'_>,
) -> Result<bool, StorageError> {
    // An expired row must not block the slot, so it is replaced in the same statement.
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {table} (id, payload, last_activity, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            payload = excluded.payload,
            last_activity = excluded.last_activity,
            expires_at = excluded.expires_at
        WHERE {table}.expires_at <= ?
        "#
    ))
    .bind(row.id)
    .bind(row.payload)
    .bind(row.last_activity)
    .bind(row.expires_at)
    .bind(row.last_activity)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(super) async fn delete_sqlite(
    pool: &Pool<Sqlite>,
    table: &str,
    id: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        DELETE FROM {table} WHERE id = ?
        "#
    ))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn gc_sqlite(
    pool: &Pool<Sqlite>,
    table: &str,
    now: i64,
    cutoff: i64,
) -> Result<u64, StorageError> {
    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {table} WHERE expires_at <= ? OR last_activity <= ?
        "#
    ))
    .bind(now)
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
