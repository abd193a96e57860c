//! Native email/password authentication: register, login, logout.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::auth::{LoginRequest, LogoutResponse, RegisterRequest, SessionResponse},
    auth::{password, session},
    db::models::users::UserCreateDBRequest,
    errors::{Error, Result},
};

/// Register a new account and start a session.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, session cookie set"),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered"),
    )
)]
#[instrument(skip_all, fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<SessionResponse> {
    let native = &state.config.auth.native;
    if !native.enabled || !native.allow_registration {
        return Err(Error::BadRequest {
            message: "Registration is disabled".to_string(),
        });
    }
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    if request.username.trim().is_empty() {
        return Err(Error::MissingField {
            field: "Username".to_string(),
        });
    }
    let password_config = &native.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!(
                "Password must be at least {} characters",
                password_config.min_length
            ),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!(
                "Password must be at most {} characters",
                password_config.max_length
            ),
        });
    }

    // Argon2 is deliberately slow; keep it off the async runtime
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })??;

    let user = state
        .users
        .create(&UserCreateDBRequest {
            email: request.email.trim().to_lowercase(),
            username: request.username.trim().to_string(),
            password_hash: Some(password_hash),
            avatar_url: None,
        })
        .await?;
    info!(user_id = %user.id, "registered new user");

    let token = session::create_session_token(user.id, &user.email, &state.config)?;
    Ok(SessionResponse {
        cookie: session::create_session_cookie(&token, &state.config),
        user,
        status: StatusCode::CREATED,
    })
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[instrument(skip_all, fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<SessionResponse> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let user = state
        .users
        .get_by_email(&request.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid_credentials)?;
    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

    let password = request.password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("verify password: {e}"),
        })??;
    if !verified {
        return Err(invalid_credentials());
    }
    info!(user_id = %user.id, "user logged in");

    let token = session::create_session_token(user.id, &user.email, &state.config)?;
    Ok(SessionResponse {
        cookie: session::create_session_cookie(&token, &state.config),
        user,
        status: StatusCode::OK,
    })
}

/// Log out by expiring the session cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Session cookie cleared"))
)]
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        cookie: session::clear_session_cookie(&state.config),
    }
}
