//! Latency samples and the images they are taken with

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One timed recognition call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock time at which the response completed
    pub timestamp: DateTime<Utc>,

    /// Time from sending the request to having the parsed response
    pub latency: Duration,

    /// Size of the request body in bytes
    pub payload_bytes: usize,

    /// Index of the image in the sampling plan
    pub image_index: usize,
}

impl Sample {
    /// Create a sample completed now
    pub fn new(latency: Duration, payload_bytes: usize, image_index: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            latency,
            payload_bytes,
            image_index,
        }
    }

    /// Latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }

    /// Line of the flat sample file: `<unix_seconds> <latency_ms> <payload_bytes>`
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}",
            self.timestamp.timestamp(),
            self.latency.as_millis(),
            self.payload_bytes
        )
    }
}

/// Image bytes ready to be posted
#[derive(Debug, Clone)]
pub struct SampleImage {
    /// URL the image was downloaded from
    pub source_url: String,

    /// Bytes sent as the request body
    pub data: Arc<Vec<u8>>,

    /// Size of the downloaded file before any resizing
    pub original_bytes: usize,

    /// Dimensions after resizing, when the image was resized
    pub dimensions: Option<(u32, u32)>,
}

impl SampleImage {
    /// Wrap downloaded bytes that are sent unchanged
    pub fn original(source_url: impl Into<String>, data: Vec<u8>) -> Self {
        let original_bytes = data.len();
        Self {
            source_url: source_url.into(),
            data: Arc::new(data),
            original_bytes,
            dimensions: None,
        }
    }

    /// Wrap a resized re-encoding of a downloaded image
    pub fn resized(
        source_url: impl Into<String>,
        data: Vec<u8>,
        original_bytes: usize,
        dimensions: (u32, u32),
    ) -> Self {
        Self {
            source_url: source_url.into(),
            data: Arc::new(data),
            original_bytes,
            dimensions: Some(dimensions),
        }
    }

    /// Number of bytes posted per call
    pub fn payload_bytes(&self) -> usize {
        self.data.len()
    }
}
