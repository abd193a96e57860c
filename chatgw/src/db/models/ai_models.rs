use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::ModelId;

/// An entry in the AI model catalog.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AiModel {
    pub id: ModelId,
    pub name: String,
    pub provider: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}
