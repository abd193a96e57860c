use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{ChatSessionId, UserId};

/// A chat session row (one conversation).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: ChatSessionId,
    pub user_id: UserId,
    /// Client-assigned conversation key, scoped per user
    pub session_key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A single message within a chat session.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
