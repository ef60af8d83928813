//! Configuration data model and validation

use crate::logging::{LogFormat, LogLevel};
use crate::types::{AppError, ConnectionMode, FailurePolicy, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key sent as the `user_key` query parameter
    #[serde(default, skip_serializing)]
    pub user_key: String,

    /// Base URL of the recognition service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Size of the worker pool
    #[serde(default = "default_num_parallel")]
    pub num_parallel: usize,

    /// Number of recognition calls to time
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,

    /// Images to send; calls are distributed round-robin over them
    #[serde(default = "default_image_urls")]
    pub image_urls: Vec<String>,

    /// Downscale images so the longest side fits this many pixels
    #[serde(default)]
    pub resize_max_dim: Option<u32>,

    /// JPEG quality used when re-encoding resized images
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Directory holding downloaded images
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Directory receiving the latency sample file
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Whether samples are written to disk at the end of the run
    #[serde(default = "default_true")]
    pub save_samples: bool,

    /// Connection handling of the recognition client
    #[serde(default)]
    pub connection_mode: ConnectionMode,

    /// Behaviour on failed recognition calls
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Skip the connectivity check against the endpoint root
    #[serde(default)]
    pub skip_ping: bool,

    /// Percentiles reported in the summary
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Minimum log level, overriding what verbose/debug imply
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Log rendering, overriding what debug implies
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_key: String::new(),
            endpoint: default_endpoint(),
            num_parallel: default_num_parallel(),
            sample_count: default_sample_count(),
            image_urls: default_image_urls(),
            resize_max_dim: None,
            jpeg_quality: default_jpeg_quality(),
            cache_dir: default_cache_dir(),
            output_dir: default_output_dir(),
            save_samples: true,
            connection_mode: ConnectionMode::default(),
            failure_policy: FailurePolicy::default(),
            skip_ping: false,
            percentiles: default_percentiles(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            log_level: None,
            log_format: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// User key with everything but the first four characters masked
    pub fn masked_user_key(&self) -> String {
        let visible: String = self.user_key.chars().take(4).collect();
        let hidden = self.user_key.chars().count().saturating_sub(4);
        format!("{}{}", visible, "*".repeat(hidden))
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.user_key.trim().is_empty() {
            return Err(AppError::config("USER_KEY is required (set it in the environment, .env or --user-key)"));
        }

        validate_http_url("endpoint", &self.endpoint)?;

        if self.image_urls.is_empty() {
            return Err(AppError::config("At least one image URL is required"));
        }
        for url in &self.image_urls {
            validate_http_url("image URL", url)?;
        }

        if self.num_parallel == 0 {
            return Err(AppError::config("Parallelism must be greater than 0"));
        }
        if self.num_parallel > crate::defaults::MAX_NUM_PARALLEL {
            return Err(AppError::config(format!(
                "Parallelism cannot exceed {}",
                crate::defaults::MAX_NUM_PARALLEL
            )));
        }

        if self.sample_count == 0 {
            return Err(AppError::config("Sample count must be greater than 0"));
        }
        if self.sample_count > crate::defaults::MAX_SAMPLE_COUNT {
            return Err(AppError::config(format!(
                "Sample count cannot exceed {}",
                crate::defaults::MAX_SAMPLE_COUNT
            )));
        }

        if let Some(dim) = self.resize_max_dim {
            if !(16..=8192).contains(&dim) {
                return Err(AppError::config(format!(
                    "Resize dimension must be between 16 and 8192 pixels, got {}",
                    dim
                )));
            }
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(AppError::config(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if self.percentiles.is_empty() {
            return Err(AppError::config("At least one percentile must be reported"));
        }
        for p in &self.percentiles {
            if !(0.0..=100.0).contains(p) {
                return Err(AppError::config(format!("Percentile {} is outside 0-100", p)));
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(user_key) = std::env::var("USER_KEY") {
            self.user_key = user_key.trim().to_string();
        }

        if let Ok(endpoint) = std::env::var("ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }

        if let Ok(num_parallel) = std::env::var("NUM_PARALLEL") {
            self.num_parallel = num_parallel.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid NUM_PARALLEL value '{}': {}", num_parallel, e)))?;
        }

        if let Ok(sample_count) = std::env::var("SAMPLE_COUNT") {
            self.sample_count = sample_count.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SAMPLE_COUNT value '{}': {}", sample_count, e)))?;
        }

        if let Ok(image_urls) = std::env::var("IMAGE_URLS") {
            let urls = split_list(&image_urls);
            if !urls.is_empty() {
                self.image_urls = urls;
            }
        }

        if let Ok(resize) = std::env::var("RESIZE_MAX_DIM") {
            let resize = resize.trim();
            self.resize_max_dim = if resize.is_empty() {
                None
            } else {
                Some(resize.parse()
                    .map_err(|e| AppError::config(format!("Invalid RESIZE_MAX_DIM value '{}': {}", resize, e)))?)
            };
        }

        if let Ok(cache_dir) = std::env::var("CACHE_DIR") {
            if !cache_dir.trim().is_empty() {
                self.cache_dir = PathBuf::from(cache_dir.trim());
            }
        }

        if let Ok(output_dir) = std::env::var("OUTPUT_DIR") {
            if !output_dir.trim().is_empty() {
                self.output_dir = PathBuf::from(output_dir.trim());
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn validate_http_url(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::config(format!("The {} cannot be empty", what)));
    }

    let parsed = url::Url::parse(value)
        .map_err(|e| AppError::config(format!("Invalid {} '{}': {}", what, value, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::config(format!(
                "Unsupported scheme '{}' in {} '{}'",
                scheme, what, value
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(AppError::config(format!("The {} '{}' has no host", what, value)));
    }

    Ok(())
}

// Default value functions for serde
fn default_endpoint() -> String {
    crate::defaults::DEFAULT_ENDPOINT.to_string()
}

fn default_num_parallel() -> usize {
    crate::defaults::DEFAULT_NUM_PARALLEL
}

fn default_sample_count() -> u32 {
    crate::defaults::DEFAULT_SAMPLE_COUNT
}

fn default_image_urls() -> Vec<String> {
    crate::defaults::DEFAULT_IMAGE_URLS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_jpeg_quality() -> u8 {
    crate::defaults::DEFAULT_JPEG_QUALITY
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_CACHE_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_OUTPUT_DIR)
}

fn default_percentiles() -> Vec<f64> {
    crate::defaults::DEFAULT_PERCENTILES.to_vec()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_true() -> bool {
    true
}
