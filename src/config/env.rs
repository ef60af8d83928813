//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::io::Write;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists; already-set variables win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                println!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            println!("No {} file found, using environment and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# FoodAI Latency Configuration
#
# Values here are used unless the same variable is already set in the
# environment; command-line flags override both.

# API key for the recognition service (required)
# USER_KEY=xxxxx

# Recognition service base URL
# ENDPOINT=https://api3.azumio.com/

# Number of parallel workers (1-256)
# NUM_PARALLEL=10

# Number of recognition calls to time (1-100000)
# SAMPLE_COUNT=100

# Images to send (comma-separated URLs)
# IMAGE_URLS=https://example.com/pizza.jpg,https://example.com/salad.jpg

# Downscale images so the longest side fits this many pixels
# RESIZE_MAX_DIM=544

# Where downloaded images are cached
# CACHE_DIR=.image_cache

# Where the latency sample file is written
# OUTPUT_DIR=.

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk, refusing to replace an existing file
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                AppError::config(format!("Failed to create example .env file {}: {}", path.display(), e))
            })?;
        file.write_all(Self::create_example_env_content().as_bytes())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "USER_KEY" => {
                if value.trim().is_empty() {
                    return Err(AppError::config("USER_KEY cannot be empty"));
                }
            }
            "ENDPOINT" => {
                url::Url::parse(value.trim())
                    .map_err(|e| AppError::config(format!("Invalid ENDPOINT '{}': {}", value, e)))?;
            }
            "IMAGE_URLS" => {
                for url in value.split(',') {
                    let url = url.trim();
                    if !url.is_empty() {
                        url::Url::parse(url)
                            .map_err(|e| AppError::config(format!("Invalid IMAGE_URLS entry '{}': {}", url, e)))?;
                    }
                }
            }
            "NUM_PARALLEL" => {
                let parallel: usize = value.trim().parse()
                    .map_err(|e| AppError::config(format!("Invalid NUM_PARALLEL value '{}': {}", value, e)))?;
                if parallel == 0 || parallel > crate::defaults::MAX_NUM_PARALLEL {
                    return Err(AppError::config(format!(
                        "NUM_PARALLEL must be between 1 and {}, got: {}",
                        crate::defaults::MAX_NUM_PARALLEL,
                        parallel
                    )));
                }
            }
            "SAMPLE_COUNT" => {
                let count: u32 = value.trim().parse()
                    .map_err(|e| AppError::config(format!("Invalid SAMPLE_COUNT value '{}': {}", value, e)))?;
                if count == 0 || count > crate::defaults::MAX_SAMPLE_COUNT {
                    return Err(AppError::config(format!(
                        "SAMPLE_COUNT must be between 1 and {}, got: {}",
                        crate::defaults::MAX_SAMPLE_COUNT,
                        count
                    )));
                }
            }
            "RESIZE_MAX_DIM" => {
                value.trim().parse::<u32>()
                    .map_err(|e| AppError::config(format!("Invalid RESIZE_MAX_DIM value '{}': {}", value, e)))?;
            }
            "ENABLE_COLOR" => {
                value.trim().parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("USER_KEY", "API key for the recognition service (required)", "xxxxx"),
            ("ENDPOINT", "Recognition service base URL", "https://api3.azumio.com/"),
            ("NUM_PARALLEL", "Number of parallel workers (1-256)", "10"),
            ("SAMPLE_COUNT", "Number of recognition calls to time", "100"),
            ("IMAGE_URLS", "Comma-separated list of image URLs", "https://example.com/pizza.jpg"),
            ("RESIZE_MAX_DIM", "Longest image side after resizing, in pixels", "544"),
            ("CACHE_DIR", "Directory for downloaded images", ".image_cache"),
            ("OUTPUT_DIR", "Directory for the sample file", "."),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<16} {}\n", var, description));
            help.push_str(&format!("  {:<16} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables, returning warnings
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }
}
