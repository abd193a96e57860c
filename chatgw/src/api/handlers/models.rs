//! AI model catalog route.

use axum::extract::State;
use tracing::instrument;

use crate::{
    AppState,
    api::models::ApiSuccess,
    auth::CurrentUser,
    db::models::ai_models::AiModel,
    errors::{Error, Result},
};

/// List the models available to the signed-in user.
#[utoipa::path(
    get,
    path = "/chat/aiModel",
    tag = "chat",
    responses(
        (status = 200, description = "Enabled models"),
        (status = 401, description = "Not signed in"),
    )
)]
#[instrument(skip_all)]
pub async fn list_models(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<AiModel>>> {
    let models = state.models.list_enabled().await.map_err(|e| {
        tracing::error!("model catalog lookup failed: {e:#}");
        Error::Internal {
            operation: "fetch AI models".to_string(),
        }
    })?;
    Ok(ApiSuccess(models))
}
