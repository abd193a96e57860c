//! Profile routes.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::{
    AppState,
    api::models::{ApiSuccess, users::ProfileUpdateRequest},
    auth::CurrentUser,
    db::models::users::{User, UserProfileUpdateDBRequest},
    errors::{Error, Result},
};

/// The signed-in user's profile.
#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "user",
    responses(
        (status = 200, description = "Profile"),
        (status = 401, description = "Not signed in"),
    )
)]
#[instrument(skip_all)]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> ApiSuccess<User> {
    ApiSuccess(user)
}

/// Update display fields on the signed-in user's profile.
#[utoipa::path(
    put,
    path = "/user/profile",
    tag = "user",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile"),
        (status = 400, description = "Nothing to update"),
        (status = 401, description = "Not signed in"),
    )
)]
#[instrument(skip_all)]
pub async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<ApiSuccess<User>> {
    if request.username.is_none() && request.avatar_url.is_none() {
        return Err(Error::BadRequest {
            message: "Nothing to update".to_string(),
        });
    }

    let updated = state
        .users
        .update_profile(
            user.id,
            &UserProfileUpdateDBRequest {
                username: request.username,
                avatar_url: request.avatar_url,
            },
        )
        .await?;
    Ok(ApiSuccess(updated))
}
