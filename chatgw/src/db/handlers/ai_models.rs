//! AI model catalog store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{
    errors::{DbError, Result},
    models::ai_models::AiModel,
};

#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Models currently offered to signed-in users.
    async fn list_enabled(&self) -> Result<Vec<AiModel>>;
}

/// Postgres-backed [`ModelCatalog`].
pub struct PgModelCatalog {
    pool: PgPool,
}

impl PgModelCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModelCatalog for PgModelCatalog {
    async fn list_enabled(&self) -> Result<Vec<AiModel>> {
        let models = sqlx::query_as::<_, AiModel>(
            "SELECT id, name, provider, enabled, created_at
             FROM ai_models
             WHERE enabled
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(models)
    }
}
