//! FoodAI Latency Harness
//!
//! Measures the latency of the FoodAI food-recognition HTTP API: sample
//! images are downloaded (and cached on disk), optionally downscaled, then
//! posted to the recognition endpoint from a bounded pool of workers. The
//! resulting latency distribution is summarised as percentiles and the raw
//! samples are written to a flat text file.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod images;
pub mod logging;
pub mod models;
pub mod output;
pub mod sampler;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, Sample, SampleImage};
pub use client::{FoodAiClient, RecognitionClient, RecognitionResponse};
pub use sampler::{Sampler, SamplingRun};
pub use stats::{percentile, LatencySummary};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    pub const DEFAULT_ENDPOINT: &str = "https://api3.azumio.com/";
    pub const DEFAULT_NUM_PARALLEL: usize = 10;
    pub const DEFAULT_SAMPLE_COUNT: u32 = 100;
    pub const DEFAULT_IMAGE_URLS: &[&str] = &[
        "https://lh3.googleusercontent.com/NdQHDaAcbd4-5kSAh0hs7Yn2nRMY4L_UnWBx1AQfDIY2B3g9qlKl6IZZ_a3xDhYqiADOXYT7OcvtdNKsARd2kyfRxaC7mLJSlA=s544",
    ];
    pub const DEFAULT_CACHE_DIR: &str = ".image_cache";
    pub const DEFAULT_OUTPUT_DIR: &str = ".";
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;
    pub const DEFAULT_PERCENTILES: &[f64] = &[50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 99.0];
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const MAX_NUM_PARALLEL: usize = 256;
    pub const MAX_SAMPLE_COUNT: u32 = 100_000;

    /// Path of the recognition call, relative to the endpoint
    pub const RECOGNITION_PATH: &str = "v1/foodrecognition/full";
    /// Characters of the ping response kept for display
    pub const PING_PREVIEW_CHARS: usize = 100;
}
