//! Asset error types.

use fieldline_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Asset operation errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Asset not found.
    #[error("asset not found: {0}")]
    NotFound(Uuid),

    /// Product not found in this organization.
    #[error("product not found: {0}")]
    ProductNotFound(Uuid),

    /// Confirmed key was not issued for this product.
    #[error("file key '{0}' does not belong to this product")]
    KeyOutsideProduct(String),

    /// External URL is not an absolute http(s) URL.
    #[error("invalid external url: {0}")]
    InvalidUrl(String),

    /// File name is blank.
    #[error("fileName is required")]
    FileNameRequired,

    /// File name exceeds the stored length.
    #[error("fileName must be at most {max} characters")]
    FileNameTooLong {
        /// Maximum length in characters.
        max: usize,
    },

    /// The key was already confirmed as an asset.
    #[error("file key '{0}' is already registered")]
    DuplicateKey(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AssetError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(_) | AssetError::ProductNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            AssetError::KeyOutsideProduct(_)
            | AssetError::InvalidUrl(_)
            | AssetError::FileNameRequired
            | AssetError::FileNameTooLong { .. } => Self::Validation(err.to_string()),
            AssetError::DuplicateKey(_) => Self::Conflict(err.to_string()),
            AssetError::Storage(e) => e.into(),
            AssetError::Repository(msg) => Self::Database(msg),
        }
    }
}
