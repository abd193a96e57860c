//! Subscription plan catalog and plan-change history.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::{
        errors::{DbError, Result},
        models::plans::{Plan, PlanHistory, PlanHistoryCreateDBRequest},
    },
    types::{PlanId, UserId},
};

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// All plans, cheapest first. Ties break on name so the listing is stable.
    async fn list(&self) -> Result<Vec<Plan>>;

    async fn get_by_id(&self, id: PlanId) -> Result<Option<Plan>>;

    async fn record_history(&self, request: &PlanHistoryCreateDBRequest) -> Result<PlanHistory>;

    /// History entries for a user, newest first.
    async fn history_for_user(&self, user_id: UserId) -> Result<Vec<PlanHistory>>;

    /// Update the status of the most recent history entry matching
    /// (user, plan). Returns the updated row when one exists.
    async fn update_history_status(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        status: &str,
    ) -> Result<Option<PlanHistory>>;
}

/// Postgres-backed [`PlanStore`].
pub struct PgPlans {
    pool: PgPool,
}

impl PgPlans {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlans {
    async fn list(&self) -> Result<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(
            "SELECT id, name, price, price_id, points, is_yearly_plan, created_at
             FROM plans
             ORDER BY price, name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(plans)
    }

    async fn get_by_id(&self, id: PlanId) -> Result<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(
            "SELECT id, name, price, price_id, points, is_yearly_plan, created_at
             FROM plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(plan)
    }

    async fn record_history(&self, request: &PlanHistoryCreateDBRequest) -> Result<PlanHistory> {
        let entry = sqlx::query_as::<_, PlanHistory>(
            "INSERT INTO plan_history (user_id, plan_id, price, label, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, plan_id, price, label, status, created_at",
        )
        .bind(request.user_id)
        .bind(request.plan_id)
        .bind(request.price)
        .bind(&request.label)
        .bind(&request.status)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(entry)
    }

    async fn history_for_user(&self, user_id: UserId) -> Result<Vec<PlanHistory>> {
        let entries = sqlx::query_as::<_, PlanHistory>(
            "SELECT id, user_id, plan_id, price, label, status, created_at
             FROM plan_history
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(entries)
    }

    async fn update_history_status(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        status: &str,
    ) -> Result<Option<PlanHistory>> {
        let entry = sqlx::query_as::<_, PlanHistory>(
            "UPDATE plan_history SET status = $3
             WHERE id = (
                 SELECT id FROM plan_history
                 WHERE user_id = $1 AND plan_id = $2
                 ORDER BY created_at DESC
                 LIMIT 1
             )
             RETURNING id, user_id, plan_id, price, label, status, created_at",
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(entry)
    }
}
