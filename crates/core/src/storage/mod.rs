//! Object storage adapter built on Apache OpenDAL.
//!
//! Clients never stream file bodies through the API: they receive a
//! short-lived presigned grant and talk to the object store directly. The
//! server-side `upload_file`/`download_file` path exists for imports and
//! background jobs.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ StorageService   policy: content type, size, key, TTL          │
//! ├───────────────────────────────────────────────────────────────┤
//! │ ObjectStoreClient (trait)                                      │
//! │   OpendalObjectStore: s3 (MinIO / AWS) │ fs (dev) │ memory     │
//! │   bucket provisioning via aws-sdk-s3 HeadBucket/CreateBucket   │
//! └───────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod config;
mod error;
mod key;
mod service;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{ByteStream, ObjectStoreClient, OpendalObjectStore, SignedRequest};
pub use config::{ALLOWED_CONTENT_TYPES, StorageConfig, StorageProvider};
pub use error::StorageError;
pub use key::{build_object_key, normalize_folder, sanitize_file_name};
pub use service::{PRESIGN_TTL, PresignedGrant, StorageService};
