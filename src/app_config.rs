//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with PAPERFLOW_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! The database URL is read separately from `DATABASE_URL`, and storage
//! secrets should be kept in environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Address the HTTP server binds to.
    pub bind_address: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "PaperFlow".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upload and listing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum note upload size in MB
    pub max_upload_size_mb: u32,
    /// Accepted note file extensions, without the dot
    pub allowed_extensions: Vec<String>,
    /// Maximum number of search results
    pub search_results: u64,
    /// Number of uploads listed in statistics
    pub recent_uploads: u64,
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb as usize * 1024 * 1024
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 50,
            allowed_extensions: ["pdf", "doc", "docx", "ppt", "pptx", "txt"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            search_results: 100,
            recent_uploads: 10,
        }
    }
}

/// Catalog policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Academic years kept per course; older ones are pruned on write
    pub retained_academic_years: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            retained_academic_years: 2,
        }
    }
}

/// Access gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Enforce premium access records. Off means free trial mode.
    pub enforce_payments: bool,
    /// View price used when site settings are missing (UGX)
    pub default_view_price: i64,
    /// Download price used when site settings are missing (UGX)
    pub default_download_price: i64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            enforce_payments: false,
            default_view_price: 500,
            default_download_price: 1000,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "local" or "s3"
    pub backend: String,
    /// Local storage path (used when backend = "local")
    pub local_path: String,
    /// URL prefix local files are served under
    pub media_url: String,
    /// S3 endpoint URL (used when backend = "s3")
    pub s3_endpoint: String,
    /// S3 region (used when backend = "s3")
    pub s3_region: String,
    /// S3 bucket name (used when backend = "s3")
    pub s3_bucket: String,
    /// S3 public URL for serving files (used when backend = "s3")
    pub s3_public_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            local_path: "./media".to_string(),
            media_url: "/media".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_bucket: "paperflow".to_string(),
            s3_public_url: "http://localhost:9000/paperflow".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub limits: LimitsConfig,
    pub catalog: CatalogConfig,
    pub access: AccessConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., PAPERFLOW_ACCESS__ENFORCE_PAYMENTS, PAPERFLOW_STORAGE__BACKEND
            .add_source(
                Environment::with_prefix("PAPERFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no deployment can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.retained_academic_years < 1 {
            return Err(ConfigError::Message(
                "catalog.retained_academic_years must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Initialize application configuration
///
/// Triggers the lazy load and logs the result. Call early in startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: site.name = {}, storage.backend = {}, access.enforce_payments = {}",
        config.site.name,
        config.storage.backend,
        config.access.enforce_payments
    );
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}
