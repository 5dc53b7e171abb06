//! Object store client seam and its OpenDAL implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use opendal::raw::PresignedRequest;
use opendal::{ErrorKind, Operator, services};

use super::config::StorageProvider;
use super::error::StorageError;

/// A boxed stream of object bytes.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// A signed HTTP request the client performs against the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP method (`PUT` or `GET`).
    pub method: String,
    /// Fully signed URL.
    pub url: String,
    /// Headers that were part of the signature.
    pub headers: HashMap<String, String>,
}

impl From<PresignedRequest> for SignedRequest {
    fn from(req: PresignedRequest) -> Self {
        let headers = req
            .header()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        Self {
            method: req.method().to_string(),
            url: req.uri().to_string(),
            headers,
        }
    }
}

/// Operations the storage adapter needs from an object store.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Short name used in logs.
    fn provider_name(&self) -> &'static str;

    /// Whether `bucket` exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;

    /// Create `bucket`. Succeeds if it already exists and is ours.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Presign a `PUT` of `key`. `content_type` is part of the signature.
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<SignedRequest, StorageError>;

    /// Presign a `GET` of `key`.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<SignedRequest, StorageError>;

    /// Stream `body` into `key`, returning the number of bytes written.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<u64, StorageError>;

    /// Stream the content of `key`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, StorageError>;

    /// Delete `key`. Deleting a missing object is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// `ObjectStoreClient` on Apache OpenDAL.
///
/// S3 operators are bound to one bucket, so one is built per call (no I/O).
/// The filesystem and memory services share a single operator and address
/// objects as `{bucket}/{key}`.
pub struct OpendalObjectStore {
    provider: StorageProvider,
    shared: Option<Operator>,
    s3_admin: Option<aws_sdk_s3::Client>,
}

impl std::fmt::Debug for OpendalObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpendalObjectStore")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl OpendalObjectStore {
    /// Create a client for `provider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the OpenDAL service cannot be initialized.
    pub fn new(provider: StorageProvider) -> Result<Self, StorageError> {
        let (shared, s3_admin) = match &provider {
            StorageProvider::S3 {
                endpoint,
                region,
                access_key_id,
                secret_access_key,
                force_path_style,
            } => {
                let credentials = Credentials::new(
                    access_key_id.clone(),
                    secret_access_key.clone(),
                    None,
                    None,
                    "fieldline-config",
                );
                let mut builder = aws_sdk_s3::config::Builder::new()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(region.clone()))
                    .credentials_provider(credentials)
                    .force_path_style(*force_path_style);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint_url(endpoint);
                }
                (None, Some(aws_sdk_s3::Client::from_conf(builder.build())))
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                let op = Operator::new(services::Fs::default().root(root))
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish();
                (Some(op), None)
            }
            StorageProvider::Memory => {
                let op = Operator::new(services::Memory::default())
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish();
                (Some(op), None)
            }
        };

        Ok(Self {
            provider,
            shared,
            s3_admin,
        })
    }

    fn s3_operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        let StorageProvider::S3 {
            endpoint,
            region,
            access_key_id,
            secret_access_key,
            force_path_style,
        } = &self.provider
        else {
            return Err(StorageError::configuration("not an s3 provider"));
        };

        let mut builder = services::S3::default()
            .bucket(bucket)
            .region(region)
            .access_key_id(access_key_id)
            .secret_access_key(secret_access_key);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint(endpoint);
        }
        if !force_path_style {
            builder = builder.enable_virtual_host_style();
        }

        Ok(Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish())
    }

    /// Resolve the operator and object path for `bucket`/`key`.
    fn locate(&self, bucket: &str, key: &str) -> Result<(Operator, String), StorageError> {
        if bucket.is_empty() || bucket.contains('/') {
            return Err(StorageError::InvalidKey(format!("invalid bucket '{bucket}'")));
        }
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        match &self.shared {
            Some(op) => Ok((op.clone(), format!("{bucket}/{key}"))),
            None => Ok((self.s3_operator(bucket)?, key.to_string())),
        }
    }
}

fn aws_error<E, R>(op: &str, bucket: &str, err: &SdkError<E, R>) -> StorageError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    StorageError::operation(format!("{op} {bucket}: {}", DisplayErrorContext(err)))
}

#[async_trait]
impl ObjectStoreClient for OpendalObjectStore {
    fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        if let Some(admin) = &self.s3_admin {
            return match admin.head_bucket().bucket(bucket).send().await {
                Ok(_) => Ok(true),
                Err(SdkError::ServiceError(ref se)) if se.raw().status().as_u16() == 404 => {
                    Ok(false)
                }
                Err(err) => Err(aws_error("head bucket", bucket, &err)),
            };
        }

        match &self.provider {
            StorageProvider::Memory => Ok(true),
            _ => {
                let (op, _) = self.locate(bucket, "probe")?;
                match op.stat(&format!("{bucket}/")).await {
                    Ok(_) => Ok(true),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if let Some(admin) = &self.s3_admin {
            let mut request = admin.create_bucket().bucket(bucket);
            if let StorageProvider::S3 { region, .. } = &self.provider
                && region != "us-east-1"
            {
                request = request.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(region.as_str()))
                        .build(),
                );
            }
            return match request.send().await {
                Ok(_) => Ok(()),
                Err(err)
                    if err.as_service_error().is_some_and(|se| {
                        se.is_bucket_already_owned_by_you() || se.is_bucket_already_exists()
                    }) =>
                {
                    Ok(())
                }
                Err(err) => Err(aws_error("create bucket", bucket, &err)),
            };
        }

        match &self.provider {
            StorageProvider::Memory => Ok(()),
            _ => {
                let (op, _) = self.locate(bucket, "probe")?;
                op.create_dir(&format!("{bucket}/")).await?;
                Ok(())
            }
        }
    }

    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<SignedRequest, StorageError> {
        let (op, path) = self.locate(bucket, key)?;
        let presigned = op
            .presign_write_with(&path, ttl)
            .content_type(content_type)
            .await?;
        let mut signed = SignedRequest::from(presigned);
        signed
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
        signed
            .headers
            .insert("Content-Type".to_string(), content_type.to_string());
        Ok(signed)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<SignedRequest, StorageError> {
        let (op, path) = self.locate(bucket, key)?;
        Ok(op.presign_read(&path, ttl).await?.into())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        mut body: ByteStream,
    ) -> Result<u64, StorageError> {
        let (op, path) = self.locate(bucket, key)?;
        let mut writer = if op.info().full_capability().write_with_content_type {
            op.writer_with(&path).content_type(content_type).await?
        } else {
            op.writer(&path).await?
        };

        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(e);
                }
            };
            written = written.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
            if let Err(e) = writer.write(chunk).await {
                let _ = writer.abort().await;
                return Err(e.into());
            }
        }
        writer.close().await?;
        Ok(written)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, StorageError> {
        let (op, path) = self.locate(bucket, key)?;
        match op.stat(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::not_found(key)),
            Err(e) => return Err(e.into()),
        }

        let stream = op.reader(&path).await?.into_bytes_stream(..).await?;
        Ok(stream
            .map(|chunk| chunk.map_err(|e| StorageError::operation(e.to_string())))
            .boxed())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let (op, path) = self.locate(bucket, key)?;
        match op.delete(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
