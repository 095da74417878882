use sqlx::{Pool, Postgres};

use crate::storage::errors::StorageError;

use super::SessionRow;

pub(super) async fn create_table_postgres(
    pool: &Pool<Postgres>,
    table: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY NOT NULL,
            payload TEXT NOT NULL,
            last_activity BIGINT NOT NULL,
            expires_at BIGINT NOT NULL
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

pub(super) async fn read_postgres(
    pool: &Pool<Postgres>,
    table: &str,
    id: &str,
    now: i64,
) -> Result<Option<String>, StorageError> {
    let payload: Option<(String,)> = sqlx::query_as(&format!(
        r#"
        SELECT payload FROM {table} WHERE id = $1 AND expires_at > $2
        "#
    ))
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(payload.map(|(p,)| p))
}

pub(super) async fn upsert_postgres(
    pool: &Pool<Postgres>,
    table: &str,
    row: &SessionRow<'_>,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {table} (id, payload, last_activity, expires_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET
            payload = EXCLUDED.payload,
            last_activity = EXCLUDED.last_activity,
            expires_at = EXCLUDED.expires_at
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

pub(super) async fn insert_if_absent_postgres(
    pool: &Pool<Postgres>,
    table: &str,
    row: &SessionRow<'_>,
) -> Result<bool, StorageError> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {table} (id, payload, last_activity, expires_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET
            payload = EXCLUDED.payload,
            last_activity = EXCLUDED.last_activity,
            expires_at = EXCLUDED.expires_at
        WHERE {table}.expires_at <= $3
        "#
    ))
    .bind(row.id)
    .bind(row.payload)
    .bind(row.last_activity)
    .bind(row.expires_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(super) async fn delete_postgres(
    pool: &Pool<Postgres>,
    table: &str,
    id: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        DELETE FROM {table} WHERE id = $1
        "#
    ))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn gc_postgres(
    pool: &Pool<Postgres>,
    table: &str,
    now: i64,
    cutoff: i64,
) -> Result<u64, StorageError> {
    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {table} WHERE expires_at <= $1 OR last_activity <= $2
        "#
    ))
    .bind(now)
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
