//! Public product change log.

use axum::extract::State;
use tracing::instrument;

use crate::{
    AppState,
    api::models::ApiSuccess,
    db::models::change_log::ChangeLogEntry,
    errors::{Error, Result},
};

/// List change-log entries, newest first. Public.
#[utoipa::path(
    get,
    path = "/user/changeLog",
    tag = "user",
    responses((status = 200, description = "Change log entries"))
)]
#[instrument(skip_all)]
pub async fn list_change_log(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<ChangeLogEntry>>> {
    let entries = state.changelog.list().await.map_err(|e| {
        tracing::error!("change log lookup failed: {e:#}");
        Error::Internal {
            operation: "fetch change log".to_string(),
        }
    })?;
    Ok(ApiSuccess(entries))
}
