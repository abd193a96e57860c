//! Chat route wire types.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionQuery {
    /// Client-assigned conversation key
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameChatRequest {
    pub session_id: Option<String>,
    pub title: Option<String>,
}
