//! Google Drive route wire types and the token-expiry response.

use axum::{
    Json,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::IntoParams;

use crate::auth::drive_token::{ACCESS_TOKEN_COOKIE, DriveToken, clear_cookie};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FileListQuery {
    /// Drive search query, passed through verbatim
    pub q: Option<String>,
    pub page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DriveStatus {
    pub authenticated: bool,
}

/// Credentials the client-side Picker widget needs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerToken {
    pub access_token: String,
    pub developer_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// 401 response for a token the upstream rejected, holding the token in its
/// `Invalid` state. When the rejected credential came from the cookie, the
/// same response clears it, returning the client to the unconnected state so
/// the next attempt starts a fresh consent flow instead of looping.
pub struct DriveAuthExpired(pub DriveToken);

impl IntoResponse for DriveAuthExpired {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": "Google Drive authentication expired",
        }));
        match self.0 {
            DriveToken::Invalid(_) | DriveToken::Present(_) => (
                StatusCode::UNAUTHORIZED,
                [(SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE))],
                body,
            )
                .into_response(),
            // No cookie credential was involved, so there is nothing to clear
            DriveToken::Absent => (StatusCode::UNAUTHORIZED, body).into_response(),
        }
    }
}
