use async_trait::async_trait;

use crate::error::Result;

/// Port for downloading images referenced by story templates
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
