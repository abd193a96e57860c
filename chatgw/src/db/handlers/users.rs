//! User account store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::{
        errors::{DbError, Result},
        models::users::{User, UserCreateDBRequest, UserProfileUpdateDBRequest},
    },
    types::{PlanId, UserId},
};

const USER_COLUMNS: &str = "id, email, username, password_hash, avatar_url, chat_points, points_used, \
     points_reset_date, stripe_customer_id, subscription_id, subscription_status, \
     default_payment_method, current_plan_id, request_plan_id, plan_start_date, \
     plan_end_date, created_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, request: &UserCreateDBRequest) -> Result<User>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn update_profile(&self, id: UserId, request: &UserProfileUpdateDBRequest) -> Result<User>;

    /// Set or clear the pending plan-change request.
    async fn set_request_plan(&self, id: UserId, plan_id: Option<PlanId>) -> Result<User>;

    /// Persist the provider's default payment method identifier.
    async fn set_default_payment_method(&self, id: UserId, payment_method: &str) -> Result<User>;
}

/// Postgres-backed [`UserStore`].
pub struct PgUsers {
    pool: PgPool,
}

impl PgUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUsers {
    async fn create(&self, request: &UserCreateDBRequest) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (email, username, password_hash, avatar_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&request.email)
            .bind(&request.username)
            .bind(&request.password_hash)
            .bind(&request.avatar_url)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(user)
    }

    async fn update_profile(&self, id: UserId, request: &UserProfileUpdateDBRequest) -> Result<User> {
        let sql = format!(
            "UPDATE users
             SET username = COALESCE($2, username),
                 avatar_url = COALESCE($3, avatar_url)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&request.username)
            .bind(&request.avatar_url)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(user)
    }

    async fn set_request_plan(&self, id: UserId, plan_id: Option<PlanId>) -> Result<User> {
        let sql = format!(
            "UPDATE users SET request_plan_id = $2 WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(plan_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(user)
    }

    async fn set_default_payment_method(&self, id: UserId, payment_method: &str) -> Result<User> {
        let sql = format!(
            "UPDATE users SET default_payment_method = $2 WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(payment_method)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(user)
    }
}
