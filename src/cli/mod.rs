//! Command-line interface

use crate::logging::{LogFormat, LogLevel};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// FoodAI Latency - measure latency percentiles of the FoodAI recognition API
#[derive(Parser, Debug, Clone)]
#[command(name = "foodai-latency")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of recognition calls to time [env: SAMPLE_COUNT]
    #[arg(short = 'n', long = "count")]
    pub count: Option<u32>,

    /// Number of parallel workers [env: NUM_PARALLEL]
    #[arg(short = 'p', long = "parallel")]
    pub parallel: Option<usize>,

    /// Recognition service base URL [env: ENDPOINT]
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API user key [env: USER_KEY]
    #[arg(long)]
    pub user_key: Option<String>,

    /// Image to send (can be used multiple times) [env: IMAGE_URLS]
    #[arg(long = "image-url", action = ArgAction::Append)]
    pub image_urls: Vec<String>,

    /// Downscale images so their longest side fits this many pixels [env: RESIZE_MAX_DIM]
    #[arg(long, value_name = "PIXELS")]
    pub resize: Option<u32>,

    /// JPEG quality used when re-encoding resized images (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Directory for downloaded images [env: CACHE_DIR]
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Delete cached images before downloading
    #[arg(long)]
    pub clear_cache: bool,

    /// Directory receiving the sample file [env: OUTPUT_DIR]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not write the sample file
    #[arg(long)]
    pub no_save: bool,

    /// Open a new connection for every request
    #[arg(long)]
    pub fresh_connections: bool,

    /// Record failed calls and continue instead of aborting the run
    #[arg(long)]
    pub keep_going: bool,

    /// Skip the connectivity check against the endpoint root
    #[arg(long)]
    pub skip_ping: bool,

    /// Percentiles to report (comma-separated, e.g. "50,90,99")
    #[arg(long, value_parser = parse_percentiles)]
    pub percentiles: Option<::std::vec::Vec<f64>>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log format (console, json, compact)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// List the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Write a commented example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.no_save && self.output_dir.is_some() {
            return Err("--output-dir has no effect together with --no-save".to_string());
        }

        Ok(())
    }

    /// Explicit color preference, `None` when left to detection
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        self.color_override().unwrap_or_else(supports_color)
    }
}

/// Parse a comma-separated percentile list
fn parse_percentiles(s: &str) -> Result<Vec<f64>, String> {
    let mut values = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let value: f64 = part
            .parse()
            .map_err(|_| format!("Invalid percentile: {}", part))?;
        if !(0.0..=100.0).contains(&value) {
            return Err(format!("Percentile must be between 0 and 100: {}", part));
        }
        values.push(value);
    }

    if values.is_empty() {
        return Err("At least one percentile is required".to_string());
    }
    Ok(values)
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
