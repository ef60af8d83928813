//! Recognition API client


use crate::{
    defaults,
    error::{AppError, Result},
    logging::ClientLogger,
    types::ConnectionMode,
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Client seam for the sampling loop
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    /// Post one JPEG to the recognition endpoint
    async fn recognize(&self, image: Vec<u8>) -> Result<RecognitionResponse>;

    /// Fetch the endpoint root and return a short preview of the body
    async fn ping(&self) -> Result<String>;
}

/// Parsed body of a successful recognition call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub body: serde_json::Value,
}

impl RecognitionResponse {
    /// Validate a raw response body
    ///
    /// The body must be a JSON object carrying an `is_food` field.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|_| AppError::recognition(format!("response is not JSON: {}", preview(body, 500))))?;

        if value.get("is_food").is_none() {
            return Err(AppError::recognition(format!(
                "response has no is_food field: {}",
                preview(body, 500)
            )));
        }

        Ok(Self { body: value })
    }

    pub fn is_food(&self) -> Option<bool> {
        self.body.get("is_food").and_then(|v| v.as_bool())
    }
}

/// Build `{endpoint}/v1/foodrecognition/full?user_key=...&top=1`
pub fn recognition_url(endpoint: &str, user_key: &str) -> Result<Url> {
    let mut base = Url::parse(endpoint.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut url = base.join(defaults::RECOGNITION_PATH)?;
    url.query_pairs_mut()
        .append_pair("user_key", user_key)
        .append_pair("top", "1");

    Ok(url)
}

fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

fn build_http_client(mode: ConnectionMode) -> Result<Client> {
    let builder = Client::builder()
        .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
        .gzip(true);

    let builder = match mode {
        ConnectionMode::Persistent => builder,
        ConnectionMode::Fresh => builder.pool_max_idle_per_host(0),
    };

    builder
        .build()
        .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))
}

/// reqwest-backed client for the FoodAI recognition service
pub struct FoodAiClient {
    endpoint: String,
    recognition_url: Url,
    mode: ConnectionMode,
    client: Client,
    logger: Option<ClientLogger>,
}

impl FoodAiClient {
    pub fn new(endpoint: &str, user_key: &str, mode: ConnectionMode) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.trim().to_string(),
            recognition_url: recognition_url(endpoint, user_key)?,
            mode,
            client: build_http_client(mode)?,
            logger: None,
        })
    }

    /// Build a client from the run configuration
    pub fn from_config(config: &crate::models::Config) -> Result<Self> {
        Self::new(&config.endpoint, &config.user_key, config.connection_mode)
    }

    pub fn with_logger(mut self, logger: ClientLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Shared client when persistent, a brand new one otherwise
    fn http(&self) -> Result<Client> {
        match self.mode {
            ConnectionMode::Persistent => Ok(self.client.clone()),
            ConnectionMode::Fresh => build_http_client(ConnectionMode::Fresh),
        }
    }

    async fn post_image(&self, image: Vec<u8>) -> Result<RecognitionResponse> {
        let response = self
            .http()?
            .post(self.recognition_url.clone())
            .header(CONTENT_TYPE, "image/jpeg")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::http_request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::http_request(format!("HTTP {}: {}", status, preview(&body, 500))));
        }

        RecognitionResponse::from_body(&body)
    }

    async fn fetch_root(&self) -> Result<String> {
        let body = self.http()?.get(&self.endpoint).send().await?.text().await?;
        Ok(preview(&body, defaults::PING_PREVIEW_CHARS))
    }
}

#[async_trait]
impl RecognitionClient for FoodAiClient {
    async fn recognize(&self, image: Vec<u8>) -> Result<RecognitionResponse> {
        let payload_bytes = image.len();
        let start = Instant::now();

        let result = self.post_image(image).await;

        if let Some(logger) = &self.logger {
            logger
                .log_recognition(self.recognition_url.path(), payload_bytes, start.elapsed(), result.is_ok())
                .await;
        }

        result
    }

    async fn ping(&self) -> Result<String> {
        let result = self.fetch_root().await;

        if let Some(logger) = &self.logger {
            logger.log_ping(&self.endpoint, &result).await;
        }

        result
    }
}
