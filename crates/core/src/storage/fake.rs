//! In-memory `ObjectStoreClient` that can presign, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};

use super::client::{ByteStream, ObjectStoreClient, SignedRequest};
use super::error::StorageError;

#[derive(Default)]
pub(crate) struct FakeObjectStore {
    pub buckets: Mutex<HashSet<String>>,
    pub objects: Mutex<HashMap<(String, String), Bytes>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeObjectStore {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &'static [u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), Bytes::from_static(data));
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn signed(method: &str, bucket: &str, key: &str, ttl: Duration) -> SignedRequest {
        SignedRequest {
            method: method.to_string(),
            url: format!(
                "http://minio.test/{bucket}/{key}?X-Amz-Expires={}",
                ttl.as_secs()
            ),
            headers: HashMap::new(),
        }
    }
}

#[async_trait]
impl ObjectStoreClient for FakeObjectStore {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        self.record(format!("bucket_exists {bucket}"));
        Ok(self.buckets.lock().unwrap().contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.record(format!("create_bucket {bucket}"));
        self.buckets.lock().unwrap().insert(bucket.to_string());
        Ok(())
    }

    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<SignedRequest, StorageError> {
        self.record(format!("presign_put {bucket}/{key}"));
        Ok(Self::signed("PUT", bucket, key, ttl))
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<SignedRequest, StorageError> {
        self.record(format!("presign_get {bucket}/{key}"));
        Ok(Self::signed("GET", bucket, key, ttl))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        body: ByteStream,
    ) -> Result<u64, StorageError> {
        self.record(format!("put_object {bucket}/{key}"));
        let chunks: Vec<Bytes> = body.try_collect().await?;
        let data = Bytes::from(chunks.concat());
        let len = data.len() as u64;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(len)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, StorageError> {
        self.record(format!("get_object {bucket}/{key}"));
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))?;
        Ok(stream::once(async move { Ok(data) }).boxed())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.record(format!("delete_object {bucket}/{key}"));
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
