//! Chat attachment upload fan-out.

use axum::extract::{Multipart, State};
use chrono::Utc;
use futures::future::join_all;
use tracing::{instrument, warn};
use url::Url;

use crate::{
    AppState,
    api::models::{ApiSuccess, uploads::UploadResponse},
    errors::{Error, Result},
};

/// Store every uploaded file and return the URLs of the ones that made
/// it. A partial failure is not an error; only losing every file is.
#[utoipa::path(
    post,
    path = "/chat/upload",
    tag = "chat",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Uploaded file URLs"),
        (status = 400, description = "No files in the request"),
        (status = 500, description = "Every upload failed"),
    )
)]
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiSuccess<UploadResponse>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Invalid multipart request: {e}"),
        })?;
        files.push((file_name, content_type, data.to_vec()));
    }

    if files.is_empty() {
        return Err(Error::BadRequest {
            message: "No files uploaded".to_string(),
        });
    }

    let uploads = files.into_iter().map(|(file_name, content_type, data)| {
        let storage = state.storage.clone();
        async move {
            let key = format!("{}-{}", Utc::now().timestamp_millis(), file_name);
            match storage.store(&key, &content_type, data).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(file = %file_name, "upload failed: {e}");
                    None
                }
            }
        }
    });

    let file_url: Vec<Url> = join_all(uploads).await.into_iter().flatten().collect();
    if file_url.is_empty() {
        return Err(Error::Internal {
            operation: "upload files".to_string(),
        });
    }

    Ok(ApiSuccess(UploadResponse { file_url }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestContext;
    use axum_test::multipart::{MultipartForm, Part};

    fn text_part(name: &str, content: &str) -> Part {
        Part::bytes(content.as_bytes().to_vec())
            .file_name(name.to_string())
            .mime_type("text/plain")
    }

    #[tokio::test]
    async fn empty_request_is_a_bad_request() {
        let ctx = TestContext::new();
        let server = ctx.server();

        let response = server
            .post("/api/chat/upload")
            .multipart(MultipartForm::new())
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "No files uploaded");
    }

    #[tokio::test]
    async fn all_files_stored_returns_every_url() {
        let ctx = TestContext::new();
        let server = ctx.server();

        let response = server
            .post("/api/chat/upload")
            .multipart(
                MultipartForm::new()
                    .add_part("files", text_part("a.txt", "aaa"))
                    .add_part("files", text_part("b.txt", "bbb")),
            )
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        let urls = body["data"]["fileUrl"].as_array().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].as_str().unwrap().ends_with("-a.txt"));
    }

    #[tokio::test]
    async fn partial_failure_returns_the_survivors() {
        let ctx = TestContext::new();
        ctx.storage.fail_matching("b.txt");
        let server = ctx.server();

        let response = server
            .post("/api/chat/upload")
            .multipart(
                MultipartForm::new()
                    .add_part("files", text_part("a.txt", "aaa"))
                    .add_part("files", text_part("b.txt", "bbb"))
                    .add_part("files", text_part("c.txt", "ccc")),
            )
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let urls = body["data"]["fileUrl"].as_array().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(!urls.iter().any(|u| u.as_str().unwrap().contains("b.txt")));
    }

    #[tokio::test]
    async fn total_failure_is_an_internal_error() {
        let ctx = TestContext::new();
        ctx.storage.fail_matching(".txt");
        let server = ctx.server();

        let response = server
            .post("/api/chat/upload")
            .multipart(MultipartForm::new().add_part("files", text_part("a.txt", "aaa")))
            .await;
        response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to upload files");
    }
}
