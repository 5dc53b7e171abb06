//! Asset service implementation.

use std::sync::Arc;

use fieldline_shared::types::{AssetId, OrganizationId, ProductId};
use url::Url;

use super::error::AssetError;
use super::types::{
    AddExternalUrlInput, AssetDownload, AssetType, ConfirmUploadInput, NewAsset, ProductAsset,
    RequestUploadInput,
};
use crate::storage::{PresignedGrant, StorageError, StorageService, sanitize_file_name};

const MAX_URL_LEN: usize = 2048;
const MAX_FILE_NAME_LEN: usize = 255;

/// Repository trait for asset persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait AssetRepository: Send + Sync {
    /// Create a new asset record.
    fn create(
        &self,
        input: NewAsset,
    ) -> impl std::future::Future<Output = Result<ProductAsset, AssetError>> + Send;

    /// Find asset by ID within a product.
    fn find_by_id(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        id: AssetId,
    ) -> impl std::future::Future<Output = Result<Option<ProductAsset>, AssetError>> + Send;

    /// List assets of a product, newest first.
    fn list_by_product(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> impl std::future::Future<Output = Result<Vec<ProductAsset>, AssetError>> + Send;

    /// Delete asset by ID.
    fn delete(
        &self,
        organization_id: OrganizationId,
        id: AssetId,
    ) -> impl std::future::Future<Output = Result<bool, AssetError>> + Send;

    /// Check if the product exists in the organization.
    fn product_exists(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> impl std::future::Future<Output = Result<bool, AssetError>> + Send;
}

/// Storage folder for a product's assets of one type.
#[must_use]
pub fn asset_folder(
    organization_id: OrganizationId,
    product_id: ProductId,
    asset_type: AssetType,
) -> String {
    format!("{organization_id}/{product_id}/{}", asset_type.as_str())
}

fn validate_external_url(raw: &str) -> Result<Url, AssetError> {
    let trimmed = raw.trim();
    let invalid = || AssetError::InvalidUrl(trimmed.to_string());
    if trimmed.len() > MAX_URL_LEN || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }
    Ok(url)
}

/// Display name for a linked URL: its last non-empty path segment, else its host.
fn name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .or_else(|| url.host_str())
        .map_or_else(|| "link".to_string(), ToString::to_string)
}

fn check_file_name(name: &str) -> Result<&str, AssetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AssetError::FileNameRequired);
    }
    if name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(AssetError::FileNameTooLong {
            max: MAX_FILE_NAME_LEN,
        });
    }
    Ok(name)
}

/// Asset service for managing product files.
pub struct AssetService<R: AssetRepository> {
    storage: Arc<StorageService>,
    repo: Arc<R>,
}

impl<R: AssetRepository> AssetService<R> {
    /// Create a new asset service.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    async fn require_product(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> Result<(), AssetError> {
        if self
            .repo
            .product_exists(organization_id, product_id)
            .await?
        {
            Ok(())
        } else {
            Err(AssetError::ProductNotFound(product_id.into_inner()))
        }
    }

    /// Issue an upload grant for a new product file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Product does not exist in the organization
    /// - Content type or size is rejected
    /// - Presigning fails
    pub async fn request_upload(
        &self,
        input: RequestUploadInput,
    ) -> Result<PresignedGrant, AssetError> {
        self.require_product(input.organization_id, input.product_id)
            .await?;

        let folder = asset_folder(input.organization_id, input.product_id, input.asset_type);
        let grant = self
            .storage
            .generate_upload_url(
                self.storage.bucket(),
                &folder,
                &input.file_name,
                &input.content_type,
                input.size_bytes,
            )
            .await?;

        tracing::info!(
            org_id = %input.organization_id,
            product_id = %input.product_id,
            key = %grant.key,
            "issued asset upload grant"
        );
        Ok(grant)
    }

    /// Record an uploaded file.
    ///
    /// The object itself is not checked; a confirm for an upload that never
    /// happened leaves a record whose download fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Product does not exist in the organization
    /// - Content type or size is rejected
    /// - The key was not issued under this product's folder
    /// - Database operation fails
    pub async fn confirm_upload(
        &self,
        input: ConfirmUploadInput,
    ) -> Result<ProductAsset, AssetError> {
        self.require_product(input.organization_id, input.product_id)
            .await?;

        let content_type = self.storage.validate_content_type(&input.content_type)?;
        self.storage.validate_file_size(input.size_bytes)?;

        let prefix = format!("{}/{}/", input.organization_id, input.product_id);
        let key = input.file_key.trim();
        if !key.starts_with(&prefix) || key.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(AssetError::KeyOutsideProduct(key.to_string()));
        }

        let file_name = check_file_name(&input.file_name)?;

        let asset = self
            .repo
            .create(NewAsset {
                id: AssetId::new(),
                organization_id: input.organization_id,
                product_id: input.product_id,
                asset_type: input.asset_type,
                file_key: Some(key.to_string()),
                external_url: None,
                file_name: file_name.to_string(),
                content_type: Some(content_type),
                size_bytes: Some(input.size_bytes),
            })
            .await?;

        tracing::info!(org_id = %asset.organization_id, asset_id = %asset.id, "confirmed asset upload");
        Ok(asset)
    }

    /// Record an asset that lives at an external URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist, the URL is not
    /// http(s), or the database operation fails.
    pub async fn add_external_url(
        &self,
        input: AddExternalUrlInput,
    ) -> Result<ProductAsset, AssetError> {
        self.require_product(input.organization_id, input.product_id)
            .await?;

        let url = validate_external_url(&input.url)?;
        let file_name = match input.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => check_file_name(name)?.to_string(),
            _ => sanitize_file_name(&name_from_url(&url))
                .chars()
                .take(MAX_FILE_NAME_LEN)
                .collect(),
        };

        self.repo
            .create(NewAsset {
                id: AssetId::new(),
                organization_id: input.organization_id,
                product_id: input.product_id,
                asset_type: input.asset_type,
                file_key: None,
                external_url: Some(url.into()),
                file_name,
                content_type: None,
                size_bytes: None,
            })
            .await
    }

    /// Get where to download an asset from.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset is not found or presigning fails.
    pub async fn download_url(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        asset_id: AssetId,
    ) -> Result<AssetDownload, AssetError> {
        let asset = self.get(organization_id, product_id, asset_id).await?;

        match (asset.file_key, asset.external_url) {
            (Some(key), _) => {
                let grant = self
                    .storage
                    .generate_download_url(self.storage.bucket(), &key)
                    .await?;
                Ok(AssetDownload::Presigned { grant })
            }
            (None, Some(url)) => Ok(AssetDownload::External { url }),
            (None, None) => Err(AssetError::repository(format!(
                "asset {asset_id} has neither file key nor url"
            ))),
        }
    }

    /// Delete an asset.
    ///
    /// The stored object is removed first (a missing object is fine), then
    /// the record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Asset not found
    /// - Storage deletion fails
    /// - Database deletion fails
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        asset_id: AssetId,
    ) -> Result<(), AssetError> {
        let asset = self.get(organization_id, product_id, asset_id).await?;

        if let Some(key) = &asset.file_key {
            match self
                .storage
                .delete_object(self.storage.bucket(), key)
                .await
            {
                Ok(()) | Err(StorageError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if !self.repo.delete(organization_id, asset_id).await? {
            return Err(AssetError::NotFound(asset_id.into_inner()));
        }

        tracing::info!(org_id = %organization_id, asset_id = %asset_id, "deleted asset");
        Ok(())
    }

    /// List a product's assets, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the database
    /// operation fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> Result<Vec<ProductAsset>, AssetError> {
        self.require_product(organization_id, product_id).await?;
        self.repo.list_by_product(organization_id, product_id).await
    }

    /// Get an asset by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if asset not found or database operation fails.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        asset_id: AssetId,
    ) -> Result<ProductAsset, AssetError> {
        self.repo
            .find_by_id(organization_id, product_id, asset_id)
            .await?
            .ok_or_else(|| AssetError::NotFound(asset_id.into_inner()))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
