//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Object storage. Asset endpoints answer 503 when absent.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for verifying tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Which object-store backend serves assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProviderKind {
    /// S3-compatible (MinIO, AWS S3).
    #[default]
    S3,
    /// Local filesystem, for development.
    LocalFs,
    /// In-process memory, for tests.
    Memory,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind.
    #[serde(default)]
    pub provider: StorageProviderKind,
    /// Endpoint URL (S3 only), e.g. `http://localhost:9000`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region (S3 only).
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID (S3 only).
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key (S3 only).
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Bucket holding product assets.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Root directory (local filesystem only).
    #[serde(default)]
    pub root: Option<String>,
    /// Upper bound for a single upload.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: i64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "fieldline-assets".to_string()
}

fn default_max_file_size() -> i64 {
    25 * 1024 * 1024
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FIELDLINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("FIELDLINE__DATABASE__URL", Some("postgres://localhost/fieldline")),
                ("FIELDLINE__JWT__SECRET", Some("s3cret")),
                ("FIELDLINE__STORAGE__PROVIDER", Some("memory")),
                ("RUN_MODE", Some("nonexistent-mode")),
            ],
            || {
                let cfg = AppConfig::load().unwrap();
                assert_eq!(cfg.database.url, "postgres://localhost/fieldline");
                assert_eq!(cfg.server.port, 8080);
                assert_eq!(cfg.jwt.access_token_expiry_secs, 900);

                let storage = cfg.storage.unwrap();
                assert_eq!(storage.provider, StorageProviderKind::Memory);
                assert_eq!(storage.bucket, "fieldline-assets");
                assert_eq!(storage.max_file_size_bytes, 25 * 1024 * 1024);
            },
        );
    }

    #[test]
    fn test_storage_is_optional() {
        temp_env::with_vars(
            [
                ("FIELDLINE__DATABASE__URL", Some("postgres://localhost/fieldline")),
                ("FIELDLINE__JWT__SECRET", Some("s3cret")),
                ("FIELDLINE__STORAGE__PROVIDER", None),
                ("RUN_MODE", Some("nonexistent-mode")),
            ],
            || {
                let cfg = AppConfig::load().unwrap();
                assert!(cfg.storage.is_none());
            },
        );
    }
}
