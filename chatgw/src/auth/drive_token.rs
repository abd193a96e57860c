//! Google Drive token relay state.
//!
//! The Drive access token lives client-side in the `google_access_token`
//! cookie; this service only relays it. The observable states and
//! transitions:
//!
//! ```text
//! Absent --(OAuth callback sets cookie)--> Present
//! Present --(upstream 401 / tokeninfo invalid)--> Invalid (cookie cleared)
//! ```
//!
//! `Invalid` is reached when the upstream rejects the token; the response
//! that reports it also clears the cookie, returning the client to `Absent`.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    auth::current_user::cookie_value,
    errors::{Error, Result},
};

pub const ACCESS_TOKEN_COOKIE: &str = "google_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "google_refresh_token";
pub const AUTH_STATE_COOKIE: &str = "google_auth_state";

/// Client-observable state of the relayed Drive credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveToken {
    /// No token cookie on the request
    Absent,
    /// A token is present; validity is unknown until the upstream answers
    Present(String),
    /// The upstream rejected the token; it must be cleared client-side
    Invalid(String),
}

impl DriveToken {
    /// Transition `Present` to `Invalid` after an upstream rejection.
    pub fn invalidated(self) -> Self {
        match self {
            DriveToken::Present(token) => DriveToken::Invalid(token),
            other => other,
        }
    }

    /// The bearer credential to forward upstream, if any.
    pub fn bearer(&self) -> Option<&str> {
        match self {
            DriveToken::Present(token) => Some(token),
            DriveToken::Absent | DriveToken::Invalid(_) => None,
        }
    }

    /// Require a forwardable token, rejecting `Absent` before any upstream
    /// call is made.
    pub fn require(&self) -> Result<&str> {
        self.bearer().ok_or_else(|| Error::Unauthenticated {
            message: Some("Not authenticated with Google Drive".to_string()),
        })
    }
}

impl FromRequestParts<AppState> for DriveToken {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self> {
        Ok(match cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE) {
            Some(token) if !token.is_empty() => DriveToken::Present(token.to_string()),
            _ => DriveToken::Absent,
        })
    }
}

/// Cookie that persists a freshly issued access token for `max_age_secs`.
pub fn access_token_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    format!("{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; Secure={secure}; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Cookie that persists the refresh token for 30 days.
pub fn refresh_token_cookie(token: &str, secure: bool) -> String {
    let max_age = 60 * 60 * 24 * 30;
    format!("{REFRESH_TOKEN_COOKIE}={token}; Path=/; HttpOnly; Secure={secure}; SameSite=Lax; Max-Age={max_age}")
}

/// Short-lived CSRF state cookie set before redirecting to the authorize URL.
pub fn auth_state_cookie(state: &str, secure: bool) -> String {
    format!("{AUTH_STATE_COOKIE}={state}; Path=/; HttpOnly; Secure={secure}; SameSite=Lax; Max-Age=600")
}

/// Expired cookie clearing a named Drive cookie.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; Max-Age=0")
}
