//! Asset types and data structures.

use chrono::{DateTime, Utc};
use fieldline_shared::types::{AssetId, OrganizationId, ProductId};
use serde::{Deserialize, Serialize};

use crate::storage::PresignedGrant;

/// What an asset is for. Also the last segment of its storage folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Product photo.
    Image,
    /// Datasheet, certificate.
    Document,
    /// Video clip.
    Video,
    /// Audio clip.
    Audio,
    /// Installation or user manual.
    Manual,
    /// Anything else.
    #[default]
    Other,
}

impl AssetType {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Manual => "manual",
            Self::Other => "other",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "document" => Some(Self::Document),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "manual" => Some(Self::Manual),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Input for requesting an upload grant.
#[derive(Debug, Clone)]
pub struct RequestUploadInput {
    /// Organization ID.
    pub organization_id: OrganizationId,
    /// Product the asset belongs to.
    pub product_id: ProductId,
    /// Asset classification.
    pub asset_type: AssetType,
    /// Original file name.
    pub file_name: String,
    /// MIME type the client will send.
    pub content_type: String,
    /// Declared size in bytes.
    pub size_bytes: i64,
}

/// Input for confirming an upload.
#[derive(Debug, Clone)]
pub struct ConfirmUploadInput {
    /// Organization ID.
    pub organization_id: OrganizationId,
    /// Product the asset belongs to.
    pub product_id: ProductId,
    /// Asset classification.
    pub asset_type: AssetType,
    /// Key from the upload grant.
    pub file_key: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
}

/// Input for linking an external URL.
#[derive(Debug, Clone)]
pub struct AddExternalUrlInput {
    /// Organization ID.
    pub organization_id: OrganizationId,
    /// Product the asset belongs to.
    pub product_id: ProductId,
    /// Asset classification.
    pub asset_type: AssetType,
    /// Absolute http(s) URL.
    pub url: String,
    /// Display name; defaults to the last URL path segment.
    pub file_name: Option<String>,
}

/// Row to insert. Exactly one of `file_key` and `external_url` is set.
#[derive(Debug, Clone)]
pub struct NewAsset {
    /// Asset ID.
    pub id: AssetId,
    /// Organization ID.
    pub organization_id: OrganizationId,
    /// Product ID.
    pub product_id: ProductId,
    /// Asset classification.
    pub asset_type: AssetType,
    /// Object key, for stored files.
    pub file_key: Option<String>,
    /// External URL, for linked assets.
    pub external_url: Option<String>,
    /// Display file name.
    pub file_name: String,
    /// MIME type, for stored files.
    pub content_type: Option<String>,
    /// Size in bytes, for stored files.
    pub size_bytes: Option<i64>,
}

/// Product asset domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAsset {
    /// Unique identifier.
    pub id: AssetId,
    /// Organization ID.
    pub organization_id: OrganizationId,
    /// Product ID.
    pub product_id: ProductId,
    /// Asset classification.
    pub asset_type: AssetType,
    /// Object key, for stored files.
    pub file_key: Option<String>,
    /// External URL, for linked assets.
    pub external_url: Option<String>,
    /// Display file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size_bytes: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Where to fetch an asset from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetDownload {
    /// Stored file: a presigned `GET`.
    Presigned {
        /// The grant.
        #[serde(flatten)]
        grant: PresignedGrant,
    },
    /// Linked asset: the URL as recorded.
    External {
        /// External URL.
        url: String,
    },
}
