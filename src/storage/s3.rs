//! S3-compatible storage backend.

use super::{mime_type_for, validate_key, ByteStream, StorageBackend, StorageError, StorageObject};
use actix_web::web::Bytes;
use async_trait::async_trait;
use futures::TryStreamExt;
use rusoto_core::{Region, RusotoError};
use rusoto_s3::{
    DeleteObjectRequest, GetObjectError, GetObjectRequest, ListObjectsV2Request, PutObjectRequest,
    S3Client, S3,
};

/// S3-compatible storage backend.
pub struct S3Storage {
    s3: S3Client,
    bucket_name: String,
    pub pub_url: String,
}

impl S3Storage {
    /// Create a new S3 storage backend.
    pub fn new(region: Region, bucket_name: String, pub_url: String) -> S3Storage {
        log::info!("S3Storage initialized for bucket: {}", bucket_name);

        S3Storage {
            s3: S3Client::new(region),
            bucket_name,
            pub_url: pub_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        log::info!("S3Storage: put_object: {}", key);

        let put_request = PutObjectRequest {
            bucket: self.bucket_name.clone(),
            key: key.to_string(),
            content_type: Some(mime_type_for(key)),
            body: Some(data.into()),
            ..Default::default()
        };

        self.s3
            .put_object(put_request)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError> {
        validate_key(key)?;
        log::debug!("S3Storage: get_object: {}", key);

        let request = GetObjectRequest {
            bucket: self.bucket_name.clone(),
            key: key.to_string(),
            ..Default::default()
        };

        let output = self.s3.get_object(request).await.map_err(|e| match e {
            RusotoError::Service(GetObjectError::NoSuchKey(msg)) => StorageError::NotFound(msg),
            other => StorageError::S3(other.to_string()),
        })?;

        let body: ByteStream = match output.body {
            Some(stream) => {
                let mapped = stream.map_ok(Bytes::from).map_err(|e: std::io::Error| {
                    std::io::Error::other(e.to_string())
                });
                Box::pin(mapped)
            }
            None => {
                return Err(StorageError::NotFound("Empty body".into()));
            }
        };

        Ok(StorageObject {
            body,
            content_length: output.content_length,
            content_type: output.content_type.or_else(|| Some(mime_type_for(key))),
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        log::info!("S3Storage: delete_object: {}", key);

        // S3 reports success for absent keys as well
        let request = DeleteObjectRequest {
            bucket: self.bucket_name.clone(),
            key: key.to_string(),
            ..Default::default()
        };

        self.s3
            .delete_object(request)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        log::debug!("S3Storage: exists: {}", key);

        // Using list_objects_v2 is reportedly faster than head_object
        // https://www.peterbe.com/plog/fastest-way-to-find-out-if-a-file-exists-in-s3
        let list_request = ListObjectsV2Request {
            bucket: self.bucket_name.clone(),
            prefix: Some(key.to_owned()),
            max_keys: Some(1),
            ..Default::default()
        };

        let result = self
            .s3
            .list_objects_v2(list_request)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(result
            .contents
            .unwrap_or_default()
            .iter()
            .any(|object| object.key.as_deref() == Some(key)))
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.pub_url, key)
    }
}
