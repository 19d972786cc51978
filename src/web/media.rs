//! Serves the local media root.

use crate::app_config::StorageConfig;
use actix_files::Files;

/// File service for stored uploads. Only the local backend serves files
/// itself; S3 objects are fetched from the bucket's public URL.
pub fn media_service(config: &StorageConfig) -> Option<Files> {
    if config.backend != "local" {
        return None;
    }
    let mount = match config.media_url.trim_end_matches('/') {
        "" => "/media",
        path => path,
    };
    Some(Files::new(mount, &config.local_path).prefer_utf8(true))
}
