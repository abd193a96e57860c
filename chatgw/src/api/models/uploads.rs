//! Upload route wire types.

use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

/// Public URLs of the attachments that stored successfully.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(value_type = Vec<String>)]
    pub file_url: Vec<Url>,
}
