use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::ChangeLogId;

/// A public change-log entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: ChangeLogId,
    pub title: String,
    pub log: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}
