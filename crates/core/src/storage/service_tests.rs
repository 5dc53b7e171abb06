use super::*;
use crate::storage::StorageProvider;
use crate::storage::fake::FakeObjectStore;
use bytes::Bytes;
use futures::{TryStreamExt, stream};
use proptest::prelude::*;
use rstest::rstest;

fn service_with(fake: Arc<FakeObjectStore>) -> StorageService {
    StorageService::new(
        fake,
        StorageConfig::new(StorageProvider::Memory).with_max_file_size(1024),
    )
}

fn fake_service() -> (Arc<FakeObjectStore>, StorageService) {
    let fake = Arc::new(FakeObjectStore::default());
    (fake.clone(), service_with(fake))
}

#[rstest]
#[case("image/png", "image/png")]
#[case("  IMAGE/JPEG ", "image/jpeg")]
#[case("text/plain; charset=utf-8", "text/plain")]
#[case("application/vnd.openxmlformats-officedocument.wordprocessingml.document", "application/vnd.openxmlformats-officedocument.wordprocessingml.document")]
#[case("audio/x-wav", "audio/x-wav")]
fn test_validate_content_type_accepts(#[case] raw: &str, #[case] want: &str) {
    let (_, service) = fake_service();
    assert_eq!(service.validate_content_type(raw).unwrap(), want);
}

#[rstest]
#[case("text/html")]
#[case("application/x-msdownload")]
#[case("")]
#[case("image")]
fn test_validate_content_type_rejects(#[case] raw: &str) {
    let (_, service) = fake_service();
    let err = service.validate_content_type(raw).unwrap_err();
    assert!(matches!(err, StorageError::UnsupportedContentType { .. }));
    assert!(err.is_validation());
}

#[test]
fn test_validate_file_size_bounds() {
    let (_, service) = fake_service();
    assert!(matches!(
        service.validate_file_size(0),
        Err(StorageError::InvalidFileSize { size: 0 })
    ));
    assert!(service.validate_file_size(-5).is_err());
    assert!(service.validate_file_size(1).is_ok());
    assert!(service.validate_file_size(1024).is_ok());
    assert!(matches!(
        service.validate_file_size(1025),
        Err(StorageError::FileTooLarge { size: 1025, max: 1024 })
    ));
}

#[tokio::test]
async fn test_generate_upload_url_builds_grant() {
    let (fake, service) = fake_service();
    let before = Utc::now();

    let grant = service
        .generate_upload_url("assets", "org/prod/image", "Front.PNG", "image/png", 512)
        .await
        .unwrap();

    assert_eq!(grant.method, "PUT");
    assert!(grant.key.starts_with("org/prod/image/Front_"));
    assert!(grant.key.ends_with(".png"));
    assert!(grant.url.contains(&grant.key));
    assert_eq!(grant.headers.get("Content-Type").map(String::as_str), Some("image/png"));

    let ttl = (grant.expires_at - before).num_seconds();
    assert!((895..=905).contains(&ttl), "ttl was {ttl}");
    assert_eq!(fake.calls(), vec![format!("presign_put assets/{}", grant.key)]);
}

#[tokio::test]
async fn test_generate_upload_url_validates_before_store() {
    let (fake, service) = fake_service();

    let err = service
        .generate_upload_url("assets", "f", "a.exe", "application/x-msdownload", 10)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = service
        .generate_upload_url("assets", "f", "a.png", "image/png", 4096)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::FileTooLarge { .. }));

    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_generate_download_url() {
    let (_, service) = fake_service();
    let grant = service
        .generate_download_url("assets", "org/prod/manual/m_0011aabb.pdf")
        .await
        .unwrap();
    assert_eq!(grant.method, "GET");
    assert_eq!(grant.key, "org/prod/manual/m_0011aabb.pdf");
    assert!(grant.headers.is_empty());
}

#[tokio::test]
async fn test_upload_and_download_file() {
    let (fake, service) = fake_service();
    let body = stream::iter(vec![
        Ok(Bytes::from_static(b"col1,col2\n")),
        Ok(Bytes::from_static(b"1,2\n")),
    ])
    .boxed();

    let key = service
        .upload_file("assets", "imports", "prices.csv", "text/csv", 14, body)
        .await
        .unwrap();
    assert!(fake.contains("assets", &key));

    let chunks: Vec<Bytes> = service
        .download_file("assets", &key)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(chunks.concat(), b"col1,col2\n1,2\n");
}

#[tokio::test]
async fn test_upload_file_cuts_oversized_stream() {
    let (fake, service) = fake_service();
    let big = Bytes::from(vec![b'x'; 2048]);
    let body = stream::iter(vec![Ok(big)]).boxed();

    let err = service
        .upload_file("assets", "imports", "big.txt", "text/plain", 100, body)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::FileTooLarge { .. }));
    assert!(fake.objects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_object_missing_is_ok() {
    let (_, service) = fake_service();
    assert!(service.delete_object("assets", "gone.pdf").await.is_ok());
}

#[tokio::test]
async fn test_ensure_bucket_exists_creates_once() {
    let (fake, service) = fake_service();
    service.ensure_bucket_exists("assets").await.unwrap();
    service.ensure_bucket_exists("assets").await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            "bucket_exists assets".to_string(),
            "create_bucket assets".to_string(),
            "bucket_exists assets".to_string(),
        ]
    );
}

proptest! {
    #[test]
    fn prop_content_type_validation(mime in "[a-z]{1,12}/[a-z0-9.+-]{1,20}") {
        let (_, service) = fake_service();
        let allowed = ALLOWED_CONTENT_TYPES.contains(&mime.as_str());
        let result = service.validate_content_type(&mime);
        prop_assert_eq!(result.is_ok(), allowed);
    }

    #[test]
    fn prop_file_size_validation(max in 1i64..10_000_000, size in -10i64..20_000_000) {
        let service = StorageService::new(
            Arc::new(FakeObjectStore::default()),
            StorageConfig::new(StorageProvider::Memory).with_max_file_size(max),
        );
        let ok = service.validate_file_size(size).is_ok();
        prop_assert_eq!(ok, size > 0 && size <= max);
    }
}
