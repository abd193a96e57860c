//! Chat session and message store.
//!
//! Lookups are keyed by the session's email claim rather than a user id,
//! so chat reads work even when the account row has drifted. The Postgres
//! implementation joins through `users` on email.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{
    errors::{DbError, Result},
    models::chats::{ChatMessage, ChatSession},
};

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Messages for one conversation, oldest first. `None` when the
    /// session key does not exist for this user.
    async fn find_log(&self, email: &str, session_key: &str) -> Result<Option<Vec<ChatMessage>>>;

    /// All of a user's chat sessions, newest first.
    async fn history(&self, email: &str) -> Result<Vec<ChatSession>>;

    /// Delete one conversation and its messages. Returns whether a
    /// session was found.
    async fn delete_session(&self, email: &str, session_key: &str) -> Result<bool>;

    /// Rename one conversation. Returns whether a session was found.
    async fn rename_session(&self, email: &str, session_key: &str, title: &str) -> Result<bool>;
}

/// Postgres-backed [`ChatStore`].
pub struct PgChats {
    pool: PgPool,
}

impl PgChats {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChats {
    async fn find_log(&self, email: &str, session_key: &str) -> Result<Option<Vec<ChatMessage>>> {
        let session_id: Option<(crate::types::ChatSessionId,)> = sqlx::query_as(
            "SELECT s.id FROM chat_sessions s
             JOIN users u ON u.id = s.user_id
             WHERE u.email = $1 AND s.session_key = $2",
        )
        .bind(email)
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let Some((session_id,)) = session_id else {
            return Ok(None);
        };

        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT role, content, created_at FROM chat_messages
             WHERE chat_session_id = $1
             ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(Some(messages))
    }

    async fn history(&self, email: &str) -> Result<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            "SELECT s.id, s.user_id, s.session_key, s.title, s.created_at
             FROM chat_sessions s
             JOIN users u ON u.id = s.user_id
             WHERE u.email = $1
             ORDER BY s.created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(sessions)
    }

    async fn delete_session(&self, email: &str, session_key: &str) -> Result<bool> {
        // chat_messages rows go with the session via ON DELETE CASCADE
        let result = sqlx::query(
            "DELETE FROM chat_sessions s
             USING users u
             WHERE u.id = s.user_id AND u.email = $1 AND s.session_key = $2",
        )
        .bind(email)
        .bind(session_key)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn rename_session(&self, email: &str, session_key: &str, title: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE chat_sessions s SET title = $3
             FROM users u
             WHERE u.id = s.user_id AND u.email = $1 AND s.session_key = $2",
        )
        .bind(email)
        .bind(session_key)
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
