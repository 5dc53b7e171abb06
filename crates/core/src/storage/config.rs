//! Storage configuration types.

use fieldline_shared::config::{StorageProviderKind, StorageSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::StorageError;

/// Content types accepted for upload.
///
/// Parameters (`; charset=...`) are stripped and the value lowercased before
/// the lookup.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
    // Video
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-msvideo",
    "video/mpeg",
    // Audio
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/webm",
    "audio/x-wav",
];

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: MinIO, AWS S3.
    S3 {
        /// Endpoint URL; `None` means AWS.
        endpoint: Option<String>,
        /// Region.
        region: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Use `endpoint/bucket/key` addressing. MinIO needs this.
        force_path_style: bool,
    },
    /// Local filesystem (development only). Buckets are subdirectories.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory (tests only). Cannot presign.
    Memory,
}

impl StorageProvider {
    /// Create an S3-compatible provider with path-style addressing.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: Some(endpoint.into()),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            force_path_style: true,
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Bucket used when the caller does not name one.
    pub bucket: String,
    /// Maximum file size in bytes.
    pub max_file_size: i64,
}

impl StorageConfig {
    /// Default max file size: 25 MiB.
    pub const DEFAULT_MAX_FILE_SIZE: i64 = 25 * 1024 * 1024;
    /// Default bucket name.
    pub const DEFAULT_BUCKET: &'static str = "fieldline-assets";

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            bucket: Self::DEFAULT_BUCKET.to_string(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set the default bucket.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: i64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Builds the storage config from the application settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` when S3 credentials or the
    /// filesystem root are missing.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.provider {
            StorageProviderKind::S3 => {
                let (Some(key_id), Some(secret)) = (
                    settings.access_key_id.clone(),
                    settings.secret_access_key.clone(),
                ) else {
                    return Err(StorageError::configuration(
                        "s3 storage requires both access_key_id and secret_access_key",
                    ));
                };
                StorageProvider::S3 {
                    endpoint: settings.endpoint.clone(),
                    region: settings.region.clone(),
                    access_key_id: key_id,
                    secret_access_key: secret,
                    force_path_style: true,
                }
            }
            StorageProviderKind::LocalFs => {
                let root = settings
                    .root
                    .clone()
                    .ok_or_else(|| StorageError::configuration("local_fs storage requires root"))?;
                StorageProvider::local_fs(root)
            }
            StorageProviderKind::Memory => StorageProvider::Memory,
        };

        if settings.max_file_size_bytes <= 0 {
            return Err(StorageError::configuration(
                "max_file_size_bytes must be positive",
            ));
        }

        Ok(Self::new(provider)
            .with_bucket(settings.bucket.clone())
            .with_max_file_size(settings.max_file_size_bytes))
    }
}
