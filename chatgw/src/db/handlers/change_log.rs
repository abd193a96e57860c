//! Product change-log store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{
    errors::{DbError, Result},
    models::change_log::ChangeLogEntry,
};

#[async_trait]
pub trait ChangeLogStore: Send + Sync {
    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<ChangeLogEntry>>;
}

/// Postgres-backed [`ChangeLogStore`].
pub struct PgChangeLog {
    pool: PgPool,
}

impl PgChangeLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeLogStore for PgChangeLog {
    async fn list(&self) -> Result<Vec<ChangeLogEntry>> {
        let entries = sqlx::query_as::<_, ChangeLogEntry>(
            "SELECT id, title, log, category, created_at
             FROM change_log
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(entries)
    }
}
