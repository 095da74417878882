mod postgres;
mod sqlite;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use sqlx::{Pool, Postgres, Sqlite};

use crate::clock::Clock;
use crate::storage::errors::StorageError;
use crate::storage::types::{SessionDriver, expiry_after, idle_cutoff, validate_key};

use postgres::*;
use sqlite::*;

enum DbPool {
    Sqlite(Pool<Sqlite>),
    Postgres(Pool<Postgres>),
}

/// Relational driver storing one row per entry: `id, payload, last_activity, expires_at`.
pub struct DatabaseSessionDriver {
    pool: DbPool,
    table: String,
    clock: Arc<dyn Clock>,
}

impl DatabaseSessionDriver {
    pub async fn sqlite(
        url: &str,
        table: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        validate_table_name(table)?;
        let opts = sqlx::sqlite::SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        create_table_sqlite(&pool, table).await?;

        tracing::info!("Using sqlite session driver, table={}", table);
        Ok(Self {
            pool: DbPool::Sqlite(pool),
            table: table.to_string(),
            clock,
        })
    }

    pub async fn postgres(
        url: &str,
        table: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        validate_table_name(table)?;
        let pool = sqlx::PgPool::connect(url).await?;
        create_table_postgres(&pool, table).await?;

        tracing::info!("Using postgres session driver, table={}", table);
        Ok(Self {
            pool: DbPool::Postgres(pool),
            table: table.to_string(),
            clock,
        })
    }
}

fn validate_table_name(table: &str) -> Result<(), StorageError> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StorageError::InvalidInput(format!(
            "Invalid session table name: {table}"
        )));
    }
    Ok(())
}

#[async_trait]
impl SessionDriver for DatabaseSessionDriver {
    #[tracing::instrument(skip(self))]
    async fn read(&self, id: &str) -> Result<Option<String>, StorageError> {
        validate_key(id)?;
        let now = self.clock.now().timestamp();
        match &self.pool {
            DbPool::Sqlite(pool) => read_sqlite(pool, &self.table, id, now).await,
            DbPool::Postgres(pool) => read_postgres(pool, &self.table, id, now).await,
        }
    }

    #[tracing::instrument(skip(self, payload))]
    async fn write(&self, id: &str, payload: &str, ttl: Duration) -> Result<(), StorageError> {
        validate_key(id)?;
        let now = self.clock.now();
        let row = SessionRow {
            id,
            payload,
            last_activity: now.timestamp(),
            expires_at: expiry_after(now, ttl).timestamp(),
        };
        match &self.pool {
            DbPool::Sqlite(pool) => upsert_sqlite(pool, &self.table, &row).await,
            DbPool::Postgres(pool) => upsert_postgres(pool, &self.table, &row).await,
        }
    }

    #[tracing::instrument(skip(self, payload))]
    async fn write_if_absent(
        &self,
        id: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        validate_key(id)?;
        let now = self.clock.now();
        let row = SessionRow {
            id,
            payload,
            last_activity: now.timestamp(),
            expires_at: expiry_after(now, ttl).timestamp(),
        };
        match &self.pool {
            DbPool::Sqlite(pool) => insert_if_absent_sqlite(pool, &self.table, &row).await,
            DbPool::Postgres(pool) => insert_if_absent_postgres(pool, &self.table, &row).await,
        }
    }

    #[tracing::instrument(skip(self))]
    async fn destroy(&self, id: &str) -> Result<(), StorageError> {
        validate_key(id)?;
        match &self.pool {
            DbPool::Sqlite(pool) => delete_sqlite(pool, &self.table, id).await,
            DbPool::Postgres(pool) => delete_postgres(pool, &self.table, id).await,
        }
    }

    #[tracing::instrument(skip(self))]
    async fn gc(&self, max_lifetime: Duration) -> Result<u64, StorageError> {
        let now = self.clock.now();
        let cutoff = idle_cutoff(now, max_lifetime).timestamp();
        let now = now.timestamp();
        match &self.pool {
            DbPool::Sqlite(pool) => gc_sqlite(pool, &self.table, now, cutoff).await,
            DbPool::Postgres(pool) => gc_postgres(pool, &self.table, now, cutoff).await,
        }
    }
}

pub(super) struct SessionRow<'a> {
    pub(super) id: &'a str,
    pub(super) payload: &'a str,
    pub(super) last_activity: i64,
    pub(super) expires_at: i64,
}
