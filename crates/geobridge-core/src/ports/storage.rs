use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Port for the object storage bucket that receives imported layers
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Whether the configured bucket is reachable
    async fn bucket_exists(&self) -> Result<bool>;

    /// Upload a local file in a single part
    async fn put_object(&self, key: &str, path: &Path, content_type: &str) -> Result<()>;

    /// Public URL of an object, resolved through the CDN base path
    fn object_url(&self, key: &str) -> String;
}
