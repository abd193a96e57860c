//! Google Drive integration.
//!
//! A thin typed client over the OAuth token endpoints and the Drive v3
//! REST API. The gateway never persists Google tokens; they live in
//! cookies on the browser and are relayed here per request.

use base64::Engine as _;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::GoogleConfig;

/// Scope requested during the consent flow. Read-only is all the chat
/// attachment picker needs.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Google rejected the access token.
    #[error("google drive token rejected")]
    Unauthorized,

    #[error("google api error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("google api request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// OAuth token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only present on the initial code exchange (and only because we
    /// request `access_type=offline` with `prompt=consent`).
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A downloaded file, content inlined as a base64 data URI so the
/// frontend can hand it straight to the model delegate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileContent {
    pub name: String,
    pub mime_type: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    name: String,
    mime_type: String,
}

pub struct DriveClient {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl DriveClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Consent screen URL the browser is redirected to.
    pub fn authorize_url(&self, redirect_uri: &Url, state: &str) -> Url {
        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", DRIVE_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);
        url
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<TokenResponse, DriveError> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        into_json(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, DriveError> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        into_json(response).await
    }

    /// Check whether an access token is still valid.
    pub async fn token_is_valid(&self, access_token: &str) -> Result<bool, DriveError> {
        let response = self
            .http
            .get(self.config.tokeninfo_url.clone())
            .query(&[("access_token", access_token)])
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    pub async fn list_files(
        &self,
        access_token: &str,
        query: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, DriveError> {
        let mut request = self
            .http
            .get(self.endpoint("files"))
            .bearer_auth(access_token)
            .query(&[
                ("pageSize", "50"),
                (
                    "fields",
                    "nextPageToken, files(id, name, mimeType, modifiedTime, size, webViewLink, iconLink)",
                ),
            ]);
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        into_json(request.send().await?).await
    }

    /// Non-trashed children of one folder.
    pub async fn list_folder(
        &self,
        access_token: &str,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, DriveError> {
        let query = format!("'{folder_id}' in parents and trashed=false");
        self.list_files(access_token, Some(&query), page_token).await
    }

    /// Download one file, exporting Google-native documents to a
    /// portable format first.
    pub async fn fetch_file(
        &self,
        access_token: &str,
        file_id: &str,
    ) -> Result<DriveFileContent, DriveError> {
        let metadata: FileMetadata = into_json(
            self.http
                .get(self.endpoint(&format!("files/{file_id}")))
                .bearer_auth(access_token)
                .query(&[("fields", "name, mimeType")])
                .send()
                .await?,
        )
        .await?;

        let (request, export_mime) = match export_mime_type(&metadata.mime_type) {
            Some(mime) => (
                self.http
                    .get(self.endpoint(&format!("files/{file_id}/export")))
                    .query(&[("mimeType", mime)]),
                mime.to_string(),
            ),
            None => (
                self.http
                    .get(self.endpoint(&format!("files/{file_id}")))
                    .query(&[("alt", "media")]),
                metadata.mime_type.clone(),
            ),
        };

        let response = request.bearer_auth(access_token).send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        debug!(file_id, size = bytes.len(), "fetched drive file");

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(DriveFileContent {
            name: metadata.name,
            mime_type: export_mime.clone(),
            content: format!("data:{export_mime};base64,{encoded}"),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.drive_url.as_str().trim_end_matches('/'))
    }
}

/// Google-native formats cannot be downloaded directly and must be
/// exported. Everything else streams as-is.
fn export_mime_type(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/vnd.google-apps.document" => Some("application/pdf"),
        "application/vnd.google-apps.spreadsheet" => {
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        }
        "application/vnd.google-apps.presentation" => Some("application/pdf"),
        _ => None,
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(DriveError::Unauthorized);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(DriveError::Api { status, message });
    }
    Ok(response)
}

async fn into_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DriveError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}
