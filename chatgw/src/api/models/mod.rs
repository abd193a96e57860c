//! Wire-format request and response types.
//!
//! All JSON crossing the API boundary is camelCase to match the web
//! client. Successful responses share one envelope shape, rendered by
//! [`ApiSuccess`]; failures render through [`crate::errors::Error`].

pub mod auth;
pub mod chats;
pub mod drive;
pub mod subscriptions;
pub mod uploads;
pub mod users;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// The success envelope: `{"success": true, "data": ...}` with 200 OK.
pub struct ApiSuccess<T>(pub T);

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        Json(json!({
            "success": true,
            "data": self.0,
        }))
        .into_response()
    }
}

/// Success envelope with a non-200 status (e.g. 201 on registration).
pub struct ApiSuccessWithStatus<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for ApiSuccessWithStatus<T> {
    fn into_response(self) -> Response {
        (self.0, ApiSuccess(self.1)).into_response()
    }
}
