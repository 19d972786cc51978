//! Per-test SQLite database and media root.

use paperflow::app_config::AppConfig;
use paperflow::storage::local::LocalStorage;
use paperflow::storage::StorageBackend;
use sea_orm::{Database, DatabaseConnection};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A fresh database with the schema applied and an empty local media root.
/// Both are removed when the context is dropped.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub storage: Arc<dyn StorageBackend>,
    db_dir: TempDir,
    media_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(mut config: AppConfig) -> Self {
        let db_dir = tempfile::tempdir().expect("Failed to create database dir");
        let database_url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("paperflow_test.db").display()
        );
        let db = Database::connect(&database_url)
            .await
            .expect("Failed to open test database");
        paperflow::db::create_schema(&db)
            .await
            .expect("Failed to create schema");

        let media_dir = tempfile::tempdir().expect("Failed to create media dir");
        config.storage.backend = "local".to_string();
        config.storage.local_path = media_dir.path().display().to_string();
        let storage: Arc<dyn StorageBackend> = Arc::new(
            LocalStorage::new(media_dir.path().to_path_buf(), config.storage.media_url.clone())
                .expect("Failed to create local storage"),
        );

        TestContext {
            db,
            config,
            storage,
            db_dir,
            media_dir,
        }
    }

    /// Same as [`TestContext::new`] with premium access enforced.
    pub async fn enforced() -> Self {
        let mut config = AppConfig::default();
        config.access.enforce_payments = true;
        Self::with_config(config).await
    }

    /// Filesystem path of a stored key.
    pub fn media_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.media_dir.path().to_path_buf(), |path, segment| {
                path.join(segment)
            })
    }
}
