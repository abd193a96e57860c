//! Request gate extractors.
//!
//! Two credential classes are expressed as axum extractors:
//!
//! - [`Session`]: the JWT session cookie is present and valid. Rejection is
//!   401 "Unauthorized" and happens before any handler code runs, so no
//!   delegate is ever invoked for an unauthenticated caller.
//! - [`CurrentUser`]: a [`Session`] whose email claim also resolves to a user
//!   record. Missing records reject with 401 rather than 404 so the error
//!   surface does not reveal whether an account exists. Routes that need the
//!   404 "User not found" distinction (billing) take [`Session`] and resolve
//!   the user themselves.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{debug, trace};

use crate::{
    AppState,
    auth::session::{self, SessionClaims},
    db::models::users::User,
    errors::{Error, Result},
};

/// A verified session credential (claims only, no database access).
#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

/// A verified session resolved to its user record.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Find a cookie value by name in the request's `Cookie` header.
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        if let Some((cookie_name, value)) = cookie.trim().split_once('=')
            && cookie_name == name
        {
            return Some(value);
        }
    }
    None
}

/// Extract claims from the JWT session cookie if present and valid.
/// Returns:
/// - None: no session cookie present
/// - Some(Ok(claims)): valid JWT found and verified
/// - Some(Err(_)): cookie present but invalid/expired
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<SessionClaims>> {
    let cookie_name = &config.auth.native.session.cookie_name;
    let token = cookie_value(&parts.headers, cookie_name)?;
    Some(session::verify_session_token(token, config))
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(claims)) => {
                trace!("Found JWT session for user: {}", claims.sub);
                Ok(Session(claims))
            }
            Some(Err(e)) => {
                trace!("JWT session verification failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => {
                trace!("No session cookie present");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;

        match state.users.get_by_email(&claims.email).await {
            Ok(Some(user)) => {
                debug!("Resolved session to user: {}", user.id);
                Ok(CurrentUser(user))
            }
            // Account missing is indistinguishable from a bad credential here
            Ok(None) => Err(Error::Unauthenticated { message: None }),
            Err(e) => Err(Error::Database(e)),
        }
    }
}
