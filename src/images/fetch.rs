//! Image downloads

use crate::error::{AppError, Result};
use reqwest::Client;

/// Downloads source images over HTTP
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET the image; any non-2xx status is an error
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_request(format!("GET {} returned {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::http_request(format!("Failed to read image body from {}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}
