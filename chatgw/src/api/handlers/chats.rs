//! Chat log and history routes.
//!
//! These routes gate on the session claims alone; the email claim is the
//! lookup key, so no account-row fetch happens before the store call.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;
use tracing::instrument;

use crate::{
    AppState,
    api::models::{ApiSuccess, chats::{ChatSessionQuery, RenameChatRequest}},
    auth::Session,
    errors::{Error, Result},
};

fn require_session_id(session_id: Option<String>) -> Result<String> {
    match session_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(Error::MissingField {
            field: "Session ID".to_string(),
        }),
    }
}

/// Fetch the message log for one conversation.
#[utoipa::path(
    get,
    path = "/chat/log",
    tag = "chat",
    params(ChatSessionQuery),
    responses(
        (status = 200, description = "Messages, oldest first"),
        (status = 400, description = "Session ID is required"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No chats found"),
    )
)]
#[instrument(skip_all)]
pub async fn chat_log(
    Session(claims): Session,
    State(state): State<AppState>,
    Query(query): Query<ChatSessionQuery>,
) -> Result<impl axum::response::IntoResponse> {
    // Validated before any store access
    let session_id = require_session_id(query.session_id)?;

    let messages = state
        .chats
        .find_log(&claims.email, &session_id)
        .await
        .map_err(|e| {
            tracing::error!("chat log lookup failed: {e:#}");
            Error::Internal {
                operation: "fetch chats".to_string(),
            }
        })?
        .ok_or_else(|| Error::NotFound {
            resource: "chats".to_string(),
        })?;

    Ok(ApiSuccess(messages))
}

/// List the caller's conversations.
#[utoipa::path(
    get,
    path = "/chat/history",
    tag = "chat",
    responses(
        (status = 200, description = "Sessions, newest first"),
        (status = 401, description = "Not signed in"),
    )
)]
#[instrument(skip_all)]
pub async fn chat_history(
    Session(claims): Session,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let sessions = state.chats.history(&claims.email).await.map_err(|e| {
        tracing::error!("chat history lookup failed: {e:#}");
        Error::Internal {
            operation: "fetch chat history".to_string(),
        }
    })?;
    Ok(ApiSuccess(sessions))
}

/// Delete one conversation.
#[utoipa::path(
    delete,
    path = "/chat/history",
    tag = "chat",
    params(ChatSessionQuery),
    responses(
        (status = 200, description = "Conversation deleted"),
        (status = 400, description = "Session ID is required"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No chats found"),
    )
)]
#[instrument(skip_all)]
pub async fn delete_chat(
    Session(claims): Session,
    State(state): State<AppState>,
    Query(query): Query<ChatSessionQuery>,
) -> Result<impl axum::response::IntoResponse> {
    let session_id = require_session_id(query.session_id)?;

    let deleted = state
        .chats
        .delete_session(&claims.email, &session_id)
        .await
        .map_err(|e| {
            tracing::error!("chat delete failed: {e:#}");
            Error::Internal {
                operation: "delete chat".to_string(),
            }
        })?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "chats".to_string(),
        });
    }
    Ok(ApiSuccess(json!({"deleted": true})))
}

/// Rename one conversation.
#[utoipa::path(
    put,
    path = "/chat/history",
    tag = "chat",
    request_body = RenameChatRequest,
    responses(
        (status = 200, description = "Conversation renamed"),
        (status = 400, description = "Session ID or title missing"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No chats found"),
    )
)]
#[instrument(skip_all)]
pub async fn rename_chat(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(request): Json<RenameChatRequest>,
) -> Result<impl axum::response::IntoResponse> {
    let session_id = require_session_id(request.session_id)?;
    let title = match request.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => {
            return Err(Error::MissingField {
                field: "Title".to_string(),
            });
        }
    };

    let renamed = state
        .chats
        .rename_session(&claims.email, &session_id, &title)
        .await
        .map_err(|e| {
            tracing::error!("chat rename failed: {e:#}");
            Error::Internal {
                operation: "update chat".to_string(),
            }
        })?;
    if !renamed {
        return Err(Error::NotFound {
            resource: "chats".to_string(),
        });
    }
    Ok(ApiSuccess(json!({"updated": true})))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestContext, session_cookie_for};
    use serde_json::json;

    #[tokio::test]
    async fn missing_session_rejects_before_any_store_call() {
        let ctx = TestContext::new();
        let server = ctx.server();

        let response = server.get("/api/chat/log").add_query_param("sessionId", "s1").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthorized");
        assert_eq!(ctx.chats.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_session_id_is_rejected_before_the_store() {
        let ctx = TestContext::new();
        let user = ctx.seed_user("alice@example.com");
        let cookie = session_cookie_for(user.id, &user.email, &ctx.state.config);
        let server = ctx.server();

        let response = server.get("/api/chat/log").add_header("cookie", cookie).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Session ID is required");
        assert_eq!(ctx.chats.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_session_key_is_not_found() {
        let ctx = TestContext::new();
        let user = ctx.seed_user("alice@example.com");
        let cookie = session_cookie_for(user.id, &user.email, &ctx.state.config);
        let server = ctx.server();

        let response = server
            .get("/api/chat/log")
            .add_query_param("sessionId", "nope")
            .add_header("cookie", cookie)
            .await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "No chats found");
    }

    #[tokio::test]
    async fn log_returns_messages_oldest_first() {
        let ctx = TestContext::new();
        let user = ctx.seed_user("alice@example.com");
        ctx.seed_chat(
            "alice@example.com",
            "conv-1",
            "Rust questions",
            &[("user", "hello"), ("assistant", "hi there")],
        );
        let cookie = session_cookie_for(user.id, &user.email, &ctx.state.config);
        let server = ctx.server();

        let response = server
            .get("/api/chat/log")
            .add_query_param("sessionId", "conv-1")
            .add_header("cookie", cookie)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"][0]["role"], "user");
        assert_eq!(body["data"][1]["content"], "hi there");
    }

    #[tokio::test]
    async fn history_lists_only_this_users_sessions() {
        let ctx = TestContext::new();
        let alice = ctx.seed_user("alice@example.com");
        ctx.seed_user("bob@example.com");
        ctx.seed_chat("alice@example.com", "conv-1", "Alice chat", &[]);
        ctx.seed_chat("bob@example.com", "conv-2", "Bob chat", &[]);
        let cookie = session_cookie_for(alice.id, &alice.email, &ctx.state.config);
        let server = ctx.server();

        let response = server.get("/api/chat/history").add_header("cookie", cookie).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let sessions = body["data"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["title"], "Alice chat");
    }

    #[tokio::test]
    async fn delete_removes_the_conversation() {
        let ctx = TestContext::new();
        let user = ctx.seed_user("alice@example.com");
        ctx.seed_chat("alice@example.com", "conv-1", "Chat", &[("user", "hi")]);
        let cookie = session_cookie_for(user.id, &user.email, &ctx.state.config);
        let server = ctx.server();

        let response = server
            .delete("/api/chat/history")
            .add_query_param("sessionId", "conv-1")
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status_ok();

        let response = server
            .get("/api/chat/log")
            .add_query_param("sessionId", "conv-1")
            .add_header("cookie", cookie)
            .await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rename_requires_a_title() {
        let ctx = TestContext::new();
        let user = ctx.seed_user("alice@example.com");
        ctx.seed_chat("alice@example.com", "conv-1", "Old title", &[]);
        let cookie = session_cookie_for(user.id, &user.email, &ctx.state.config);
        let server = ctx.server();

        let response = server
            .put("/api/chat/history")
            .add_header("cookie", cookie)
            .json(&json!({"sessionId": "conv-1"}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Title is required");
    }

    #[tokio::test]
    async fn rename_updates_the_title() {
        let ctx = TestContext::new();
        let user = ctx.seed_user("alice@example.com");
        ctx.seed_chat("alice@example.com", "conv-1", "Old title", &[]);
        let cookie = session_cookie_for(user.id, &user.email, &ctx.state.config);
        let server = ctx.server();

        let response = server
            .put("/api/chat/history")
            .add_header("cookie", cookie.clone())
            .json(&json!({"sessionId": "conv-1", "title": "New title"}))
            .await;
        response.assert_status_ok();

        let response = server.get("/api/chat/history").add_header("cookie", cookie).await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"][0]["title"], "New title");
    }
}
