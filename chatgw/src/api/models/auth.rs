//! Auth wire types: register/login payloads and cookie-bearing responses.

use axum::{
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{ApiSuccess, ApiSuccessWithStatus};
use crate::db::models::users::User;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Success envelope carrying the user plus a `Set-Cookie` for the session.
pub struct SessionResponse {
    pub user: User,
    pub cookie: String,
    pub status: StatusCode,
}

impl IntoResponse for SessionResponse {
    fn into_response(self) -> Response {
        (
            [(SET_COOKIE, self.cookie)],
            ApiSuccessWithStatus(self.status, self.user),
        )
            .into_response()
    }
}

/// Logout response: clears the session cookie.
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (
            [(SET_COOKIE, self.cookie)],
            ApiSuccess(serde_json::json!({"loggedOut": true})),
        )
            .into_response()
    }
}
