use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{PlanId, UserId};

/// A user account row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub chat_points: i32,
    pub points_used: i32,
    pub points_reset_date: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub subscription_status: Option<String>,
    pub default_payment_method: Option<String>,
    pub current_plan_id: Option<PlanId>,
    pub request_plan_id: Option<PlanId>,
    pub plan_start_date: Option<DateTime<Utc>>,
    pub plan_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a user.
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
}

/// Payload for updating a user's display fields.
#[derive(Debug, Clone, Default)]
pub struct UserProfileUpdateDBRequest {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}
