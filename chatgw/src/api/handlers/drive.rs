//! Google Drive OAuth flow and file browsing.
//!
//! The gateway relays the user's Drive token; it never stores one. On
//! any upstream 401 the response clears the token cookie so the client
//! falls back to the unconnected state.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rand::{Rng, distr::Alphanumeric};
use tracing::{instrument, warn};

use crate::{
    AppState,
    api::models::{
        ApiSuccess,
        drive::{CallbackQuery, DriveAuthExpired, DriveStatus, FileListQuery, PickerToken},
    },
    auth::{
        current_user::cookie_value,
        drive_token::{
            ACCESS_TOKEN_COOKIE, AUTH_STATE_COOKIE, DriveToken, REFRESH_TOKEN_COOKIE,
            access_token_cookie, auth_state_cookie, clear_cookie, refresh_token_cookie,
        },
    },
    drive::DriveError,
    errors::{Error, Result},
};

fn callback_redirect_uri(state: &AppState) -> Result<url::Url> {
    state
        .config
        .app_url
        .join("/api/google/callback")
        .map_err(|e| Error::Internal {
            operation: format!("build OAuth redirect URI: {e}"),
        })
}

fn app_redirect(state: &AppState, query: &str) -> Redirect {
    let mut url = state.config.app_url.clone();
    url.set_query(Some(query));
    Redirect::to(url.as_str())
}

/// Upstream rejected the token: transition it to `Invalid` and answer with
/// the cookie-clearing 401. Anything else is our fault and renders as a
/// plain 500.
fn drive_failure(token: DriveToken, err: DriveError, operation: &str) -> Result<Response> {
    match err {
        DriveError::Unauthorized => Ok(DriveAuthExpired(token.invalidated()).into_response()),
        e => {
            warn!("google drive request failed: {e}");
            Err(Error::Internal {
                operation: operation.to_string(),
            })
        }
    }
}

/// Start the OAuth consent flow.
#[utoipa::path(
    get,
    path = "/google/auth",
    tag = "google",
    responses((status = 303, description = "Redirect to the Google consent screen"))
)]
#[instrument(skip_all)]
pub async fn google_auth(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let csrf_state: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let redirect_uri = callback_redirect_uri(&state)?;
    let url = state.drive.authorize_url(&redirect_uri, &csrf_state);
    let secure = state.config.auth.native.session.cookie_secure;

    Ok((
        AppendHeaders([(SET_COOKIE, auth_state_cookie(&csrf_state, secure))]),
        Redirect::to(url.as_str()),
    ))
}

/// OAuth callback: exchange the code and persist tokens as cookies.
#[utoipa::path(
    get,
    path = "/google/callback",
    tag = "google",
    params(CallbackQuery),
    responses((status = 303, description = "Redirect back to the app"))
)]
#[instrument(skip_all)]
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        warn!(error, "google consent flow returned an error");
        return Ok(app_redirect(&state, "error=google_auth_denied").into_response());
    }

    // CSRF check: the state parameter must match the cookie we set
    let expected_state = cookie_value(&headers, AUTH_STATE_COOKIE);
    if expected_state.is_none() || query.state.as_deref() != expected_state {
        warn!("google callback state mismatch");
        return Ok(app_redirect(&state, "error=invalid_state").into_response());
    }

    let Some(code) = query.code else {
        return Ok(app_redirect(&state, "error=missing_code").into_response());
    };

    let redirect_uri = callback_redirect_uri(&state)?;
    let tokens = match state.drive.exchange_code(&code, &redirect_uri).await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("google code exchange failed: {e}");
            return Ok(app_redirect(&state, "error=google_auth_failed").into_response());
        }
    };

    let secure = state.config.auth.native.session.cookie_secure;
    let mut cookies = vec![
        (SET_COOKIE, access_token_cookie(&tokens.access_token, tokens.expires_in, secure)),
        (SET_COOKIE, clear_cookie(AUTH_STATE_COOKIE)),
    ];
    if let Some(refresh_token) = &tokens.refresh_token {
        cookies.push((SET_COOKIE, refresh_token_cookie(refresh_token, secure)));
    }

    Ok((AppendHeaders(cookies), app_redirect(&state, "google_auth=success")).into_response())
}

/// Mint a fresh access token from the refresh token cookie.
#[utoipa::path(
    post,
    path = "/google/refresh",
    tag = "google",
    responses(
        (status = 200, description = "New access token cookie set"),
        (status = 401, description = "No refresh token, or Google rejected it"),
    )
)]
#[instrument(skip_all)]
pub async fn google_refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let Some(refresh_token) = cookie_value(&headers, REFRESH_TOKEN_COOKIE) else {
        return Err(Error::Unauthenticated {
            message: Some("Not authenticated with Google Drive".to_string()),
        });
    };

    match state.drive.refresh(refresh_token).await {
        Ok(tokens) => {
            let secure = state.config.auth.native.session.cookie_secure;
            Ok((
                AppendHeaders([(
                    SET_COOKIE,
                    access_token_cookie(&tokens.access_token, tokens.expires_in, secure),
                )]),
                ApiSuccess(serde_json::json!({"expiresIn": tokens.expires_in})),
            )
                .into_response())
        }
        Err(e) => {
            warn!("google token refresh failed: {e}");
            // A dead refresh token is cleared along with the access token
            Ok((
                axum::http::StatusCode::UNAUTHORIZED,
                AppendHeaders([
                    (SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE)),
                    (SET_COOKIE, clear_cookie(REFRESH_TOKEN_COOKIE)),
                ]),
                axum::Json(serde_json::json!({
                    "success": false,
                    "message": "Google Drive authentication expired",
                })),
            )
                .into_response())
        }
    }
}

/// Report whether the relayed Drive token is usable.
#[utoipa::path(
    get,
    path = "/google/status",
    tag = "google",
    responses((status = 200, description = "Connection state"))
)]
#[instrument(skip_all)]
pub async fn google_status(token: DriveToken, State(state): State<AppState>) -> Result<Response> {
    let Some(access_token) = token.bearer() else {
        return Ok(ApiSuccess(DriveStatus { authenticated: false }).into_response());
    };

    match state.drive.token_is_valid(access_token).await {
        Ok(true) => Ok(ApiSuccess(DriveStatus { authenticated: true }).into_response()),
        Ok(false) => Ok((
            AppendHeaders([(SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE))]),
            ApiSuccess(DriveStatus { authenticated: false }),
        )
            .into_response()),
        Err(e) => {
            warn!("google tokeninfo check failed: {e}");
            Err(Error::Internal {
                operation: "check Google Drive status".to_string(),
            })
        }
    }
}

/// List Drive files visible to the user.
#[utoipa::path(
    get,
    path = "/google/files",
    tag = "google",
    params(FileListQuery),
    responses(
        (status = 200, description = "File listing"),
        (status = 401, description = "Not connected or token expired"),
    )
)]
#[instrument(skip_all)]
pub async fn list_drive_files(
    token: DriveToken,
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> Result<Response> {
    let access_token = token.require()?;
    match state
        .drive
        .list_files(access_token, query.q.as_deref(), query.page_token.as_deref())
        .await
    {
        Ok(list) => Ok(ApiSuccess(list).into_response()),
        Err(e) => drive_failure(token, e, "fetch files from Google Drive"),
    }
}

/// Download one Drive file (exported if Google-native).
#[utoipa::path(
    get,
    path = "/google/files/{file_id}",
    tag = "google",
    params(("file_id" = String, Path, description = "Drive file ID")),
    responses(
        (status = 200, description = "File content as a base64 data URI"),
        (status = 401, description = "Not connected or token expired"),
    )
)]
#[instrument(skip_all, fields(file_id = %file_id))]
pub async fn get_drive_file(
    token: DriveToken,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response> {
    let access_token = token.require()?;
    match state.drive.fetch_file(access_token, &file_id).await {
        Ok(file) => Ok(ApiSuccess(file).into_response()),
        Err(e) => drive_failure(token, e, "fetch file from Google Drive"),
    }
}

/// List the contents of one Drive folder.
#[utoipa::path(
    get,
    path = "/google/folders/{folder_id}",
    tag = "google",
    params(("folder_id" = String, Path, description = "Drive folder ID")),
    responses(
        (status = 200, description = "Folder contents"),
        (status = 401, description = "Not connected or token expired"),
    )
)]
#[instrument(skip_all, fields(folder_id = %folder_id))]
pub async fn list_drive_folder(
    token: DriveToken,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    Query(query): Query<FileListQuery>,
) -> Result<Response> {
    let access_token = token.require()?;
    match state
        .drive
        .list_folder(access_token, &folder_id, query.page_token.as_deref())
        .await
    {
        Ok(list) => Ok(ApiSuccess(list).into_response()),
        Err(e) => drive_failure(token, e, "fetch folder contents from Google Drive"),
    }
}

/// Hand the client the credentials the Google Picker widget needs.
#[utoipa::path(
    get,
    path = "/google/picker-token",
    tag = "google",
    responses(
        (status = 200, description = "Access token and developer key for the Picker"),
        (status = 401, description = "Not connected"),
        (status = 500, description = "No Picker API key configured"),
    )
)]
#[instrument(skip_all)]
pub async fn picker_token(
    token: DriveToken,
    State(state): State<AppState>,
) -> Result<ApiSuccess<PickerToken>> {
    let access_token = token.require()?;
    let Some(developer_key) = state.config.google.api_key.clone() else {
        warn!("google picker requested but no API key is configured");
        return Err(Error::Internal {
            operation: "load Google Picker credentials".to_string(),
        });
    };

    Ok(ApiSuccess(PickerToken {
        access_token: access_token.to_string(),
        developer_key,
        app_id: state.config.google.app_id.clone(),
    }))
}
