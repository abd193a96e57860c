//! Upload storage backends.
//!
//! Uploaded chat attachments are written to an object store and served
//! back to the client by public URL. The S3 backend is what production
//! runs; the local backend exists for development and tests.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;
use url::Url;

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored object has no valid public url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait UploadStorage: Send + Sync {
    /// Store one object under `key` and return its public URL.
    async fn store(&self, key: &str, content_type: &str, content: Vec<u8>)
        -> Result<Url, StorageError>;
}

/// S3 (or S3-compatible) backed [`UploadStorage`].
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: Url,
}

impl S3Storage {
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        public_base_url: Url,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));
        if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                key_id, secret, None, None, "chatgw-config",
            ));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint_url {
            // Path-style addressing for MinIO and friends
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl UploadStorage for S3Storage {
    async fn store(
        &self,
        key: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<Url, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        debug!(bucket = %self.bucket, key, "stored object");
        public_url(&self.public_base_url, key)
    }
}

/// Filesystem-backed [`UploadStorage`] for local development.
pub struct LocalStorage {
    path: PathBuf,
    public_base_url: Url,
}

impl LocalStorage {
    pub fn new(path: PathBuf, public_base_url: Url) -> Self {
        Self {
            path,
            public_base_url,
        }
    }
}

#[async_trait]
impl UploadStorage for LocalStorage {
    async fn store(
        &self,
        key: &str,
        _content_type: &str,
        content: Vec<u8>,
    ) -> Result<Url, StorageError> {
        tokio::fs::create_dir_all(&self.path).await?;
        let file_path = self.path.join(key);
        tokio::fs::write(&file_path, content).await?;
        debug!(path = %file_path.display(), "stored object");
        public_url(&self.public_base_url, key)
    }
}

fn public_url(base: &Url, key: &str) -> Result<Url, StorageError> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), key);
    Ok(Url::parse(&joined)?)
}

/// Build the storage backend selected in the configuration.
pub async fn create_storage(config: &StorageConfig) -> Arc<dyn UploadStorage> {
    match config {
        StorageConfig::S3 {
            bucket,
            region,
            endpoint_url,
            access_key_id,
            secret_access_key,
            public_base_url,
        } => Arc::new(
            S3Storage::new(
                bucket.clone(),
                region.clone(),
                endpoint_url.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                public_base_url.clone(),
            )
            .await,
        ),
        StorageConfig::Local {
            path,
            public_base_url,
        } => Arc::new(LocalStorage::new(path.clone(), public_base_url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_storage_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let base = Url::parse("http://localhost:3000/uploads/").unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), base);

        let url = storage
            .store("1700000000000-notes.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:3000/uploads/1700000000000-notes.txt"
        );
        let written = std::fs::read(dir.path().join("1700000000000-notes.txt")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[test]
    fn public_url_handles_base_without_trailing_slash() {
        let base = Url::parse("https://cdn.example.com/files").unwrap();
        let url = public_url(&base, "a.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/files/a.png");
    }
}
