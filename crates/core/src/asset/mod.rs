//! Product asset lifecycle.
//!
//! File assets are uploaded in two phases: the client asks for a presigned
//! grant, uploads straight to the object store, then confirms so the
//! metadata is recorded. An asset can also point at an external URL, in
//! which case nothing is stored.
//!
//! ```text
//! NoGrantIssued --request_upload--> GrantIssued(expiry)
//!      --client PUT--> uploaded --confirm_upload--> MetadataConfirmed
//! ```

mod error;
mod service;
mod types;

pub use error::AssetError;
pub use service::{AssetRepository, AssetService, asset_folder};
pub use types::{
    AddExternalUrlInput, AssetDownload, AssetType, ConfirmUploadInput, NewAsset, ProductAsset,
    RequestUploadInput,
};
