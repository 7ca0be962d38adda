use async_trait::async_trait;
use geobridge_core::ports::ImageSource;
use geobridge_core::{BridgeError, Result};

const SERVICE: &str = "image host";

/// Downloads story images over HTTP
#[derive(Clone, Default)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await.map_err(|e| {
            BridgeError::Unreachable { service: SERVICE.to_string(), reason: e.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::upstream(SERVICE, status.as_u16(), url));
        }

        let bytes = response.bytes().await.map_err(|e| BridgeError::Unreachable {
            service: SERVICE.to_string(),
            reason: format!("Failed to read {}: {}", url, e),
        })?;
        Ok(bytes.to_vec())
    }
}
