//! Storage policy: validation, key minting and presigned grants.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;

use super::client::{ByteStream, ObjectStoreClient, OpendalObjectStore};
use super::config::{ALLOWED_CONTENT_TYPES, StorageConfig};
use super::error::StorageError;
use super::key::build_object_key;

/// Lifetime of every presigned grant, upload or download.
pub const PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);

/// A time-limited credential for one direct request to the object store.
///
/// Grants are never persisted and cannot be revoked; they simply expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedGrant {
    /// Signed URL.
    pub url: String,
    /// HTTP method to use (`PUT` for upload, `GET` for download).
    pub method: String,
    /// Object key the grant is bound to.
    pub key: String,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
    /// Headers the client must send (uploads carry `Content-Type`).
    pub headers: HashMap<String, String>,
}

/// Object storage adapter.
#[derive(Clone)]
pub struct StorageService {
    client: Arc<dyn ObjectStoreClient>,
    config: StorageConfig,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("provider", &self.client.provider_name())
            .field("bucket", &self.config.bucket)
            .field("max_file_size", &self.config.max_file_size)
            .finish()
    }
}

fn expiry() -> DateTime<Utc> {
    Utc::now()
        + chrono::Duration::from_std(PRESIGN_TTL).unwrap_or_else(|_| chrono::Duration::minutes(15))
}

impl StorageService {
    /// Create a storage service on top of an existing client.
    #[must_use]
    pub fn new(client: Arc<dyn ObjectStoreClient>, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Create a storage service backed by OpenDAL.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let client = OpendalObjectStore::new(config.provider.clone())?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Default bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Normalize and check a content type against the allow-list.
    ///
    /// Parameters after `;` are dropped, then the value is trimmed and
    /// lowercased. Returns the normalized type.
    pub fn validate_content_type(&self, content_type: &str) -> Result<String, StorageError> {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if ALLOWED_CONTENT_TYPES.contains(&normalized.as_str()) {
            Ok(normalized)
        } else {
            Err(StorageError::unsupported_content_type(content_type))
        }
    }

    /// Reject sizes that are not positive or exceed the configured maximum.
    pub fn validate_file_size(&self, size: i64) -> Result<(), StorageError> {
        if size <= 0 {
            return Err(StorageError::InvalidFileSize { size });
        }
        if size > self.config.max_file_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }
        Ok(())
    }

    /// Issue a presigned `PUT` for a new object under `folder`.
    ///
    /// Validation runs before any store interaction; a rejected request never
    /// reaches the object store.
    pub async fn generate_upload_url(
        &self,
        bucket: &str,
        folder: &str,
        file_name: &str,
        content_type: &str,
        size: i64,
    ) -> Result<PresignedGrant, StorageError> {
        let content_type = self.validate_content_type(content_type)?;
        self.validate_file_size(size)?;

        let key = build_object_key(folder, file_name);
        let signed = self
            .client
            .presign_put(bucket, &key, &content_type, PRESIGN_TTL)
            .await?;

        let mut headers = signed.headers;
        headers.insert("Content-Type".to_string(), content_type);

        tracing::debug!(bucket, key = %key, "issued upload grant");
        Ok(PresignedGrant {
            url: signed.url,
            method: signed.method,
            key,
            expires_at: expiry(),
            headers,
        })
    }

    /// Issue a presigned `GET` for `key`. Existence is not checked.
    pub async fn generate_download_url(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<PresignedGrant, StorageError> {
        let signed = self.client.presign_get(bucket, key, PRESIGN_TTL).await?;
        Ok(PresignedGrant {
            url: signed.url,
            method: signed.method,
            key: key.to_string(),
            expires_at: expiry(),
            headers: signed.headers,
        })
    }

    /// Stream a file into the store from the server side. Returns the new key.
    ///
    /// `size` is the declared size; the stream is cut off with
    /// `FileTooLarge` if it carries more than the configured maximum.
    pub async fn upload_file(
        &self,
        bucket: &str,
        folder: &str,
        file_name: &str,
        content_type: &str,
        size: i64,
        body: ByteStream,
    ) -> Result<String, StorageError> {
        let content_type = self.validate_content_type(content_type)?;
        self.validate_file_size(size)?;

        let max = self.config.max_file_size;
        let mut seen: i64 = 0;
        let limited = body
            .map(move |chunk| {
                let chunk = chunk?;
                seen = seen.saturating_add(i64::try_from(chunk.len()).unwrap_or(i64::MAX));
                if seen > max {
                    return Err(StorageError::FileTooLarge { size: seen, max });
                }
                Ok(chunk)
            })
            .boxed();

        let key = build_object_key(folder, file_name);
        let written = self
            .client
            .put_object(bucket, &key, &content_type, limited)
            .await?;

        tracing::debug!(bucket, key = %key, written, "uploaded object");
        Ok(key)
    }

    /// Stream an object out of the store.
    pub async fn download_file(&self, bucket: &str, key: &str) -> Result<ByteStream, StorageError> {
        self.client.get_object(bucket, key).await
    }

    /// Delete an object. Missing objects are not an error.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client.delete_object(bucket, key).await
    }

    /// Create `bucket` if it does not exist yet.
    pub async fn ensure_bucket_exists(&self, bucket: &str) -> Result<(), StorageError> {
        if self.client.bucket_exists(bucket).await? {
            return Ok(());
        }
        tracing::info!(bucket, provider = self.client.provider_name(), "creating bucket");
        self.client.create_bucket(bucket).await
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
