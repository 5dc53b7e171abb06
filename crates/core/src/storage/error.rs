//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Content type is not on the allow-list.
    #[error("content type '{content_type}' is not allowed")]
    UnsupportedContentType {
        /// The rejected content type, as sent.
        content_type: String,
    },

    /// Declared size is zero or negative.
    #[error("file size must be positive, got {size}")]
    InvalidFileSize {
        /// Declared size.
        size: i64,
    },

    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual or declared size.
        size: i64,
        /// Maximum allowed size.
        max: i64,
    },

    /// Invalid storage key.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create an unsupported content type error.
    #[must_use]
    pub fn unsupported_content_type(content_type: impl Into<String>) -> Self {
        Self::UnsupportedContentType {
            content_type: content_type.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// True for policy violations the caller can fix (bad type, size, key).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedContentType { .. }
                | Self::InvalidFileSize { .. }
                | Self::FileTooLarge { .. }
                | Self::InvalidKey(_)
        )
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<StorageError> for fieldline_shared::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            e if e.is_validation() => Self::Validation(e.to_string()),
            StorageError::NotFound { key } => Self::NotFound(format!("object {key}")),
            e => Self::ExternalService(e.to_string()),
        }
    }
}
