//! Media storage using Cloudflare R2
//!
//! Handles upload, delete, and URL generation for uploaded images.
//! Files are served via R2 Custom Domains (CDN): one bucket for
//! community post images, one for profile avatars.

use aws_sdk_s3::Client as S3Client;

use crate::config::{BucketConfig, CloudflareConfig, StorageConfig};
use crate::error::AppError;

fn image_file_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Media storage service
///
/// Uploads images to Cloudflare R2 and returns public URLs.
pub struct MediaStorage {
    /// S3-compatible client for R2
    client: S3Client,
    /// Community post images bucket
    community: BucketConfig,
    /// Profile avatars bucket
    avatars: BucketConfig,
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Arguments
    /// * `config` - Storage configuration (both buckets)
    /// * `cloudflare` - Cloudflare credentials
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(
        config: &StorageConfig,
        cloudflare: &CloudflareConfig,
    ) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        // Create credentials
        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "modam-r2",
        );

        // Build S3 config for R2
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .http_client(super::build_r2_http_client())
            .credentials_provider(credentials)
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            community: config.community.clone(),
            avatars: config.avatars.clone(),
        })
    }

    /// Upload a file to a bucket
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let byte_count = data.len() as f64;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("R2 upload failed: {}", e)))?;

        crate::metrics::IMAGE_UPLOADS_TOTAL.inc();
        crate::metrics::IMAGE_BYTES_UPLOADED.inc_by(byte_count);

        Ok(())
    }

    /// Upload a community post image
    ///
    /// # Arguments
    /// * `id` - Unique identifier for the image
    /// * `data` - Image data
    /// * `content_type` - MIME type
    ///
    /// # Returns
    /// (object key, public URL)
    pub async fn upload_community_image(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let ext = image_file_extension(content_type);
        let key = format!("posts/{}.{}", id, ext);
        self.upload(&self.community.bucket, &key, data, content_type)
            .await?;
        Ok((key.clone(), self.community_public_url(&key)))
    }

    /// Upload a profile avatar
    ///
    /// Stored under avatars/ as WebP.
    ///
    /// # Returns
    /// (object key, public URL)
    pub async fn upload_avatar(
        &self,
        id: &str,
        data: Vec<u8>,
    ) -> Result<(String, String), AppError> {
        let key = format!("avatars/{}.webp", id);
        self.upload(&self.avatars.bucket, &key, data, "image/webp")
            .await?;
        Ok((key.clone(), self.avatar_public_url(&key)))
    }

    /// Delete an object from the community bucket
    pub async fn delete_community_image(&self, key: &str) -> Result<(), AppError> {
        self.delete(&self.community.bucket, key).await
    }

    /// Delete an object from the avatars bucket
    pub async fn delete_avatar(&self, key: &str) -> Result<(), AppError> {
        self.delete(&self.avatars.bucket, key).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("R2 delete failed: {}", e)))?;

        Ok(())
    }

    /// Public URL for a community image key
    pub fn community_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.community.public_url, key)
    }

    /// Public URL for an avatar key
    pub fn avatar_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.avatars.public_url, key)
    }
}
