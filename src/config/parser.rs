//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
    types::{ConnectionMode, FailurePolicy},
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::config)?;

        let mut config = Config::default();

        // .env only fills variables that are not already set
        EnvManager::load_env_file(self.cli.debug)?;

        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(count) = cli.count {
            config.sample_count = count;
        }
        if let Some(parallel) = cli.parallel {
            config.num_parallel = parallel;
        }
        if let Some(ref endpoint) = cli.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(ref user_key) = cli.user_key {
            config.user_key = user_key.clone();
        }
        if !cli.image_urls.is_empty() {
            config.image_urls = cli.image_urls.clone();
        }
        if let Some(resize) = cli.resize {
            config.resize_max_dim = Some(resize);
        }
        if let Some(quality) = cli.quality {
            config.jpeg_quality = quality;
        }
        if let Some(ref cache_dir) = cli.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(ref output_dir) = cli.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(ref percentiles) = cli.percentiles {
            config.percentiles = percentiles.clone();
        }

        if cli.no_save {
            config.save_samples = false;
        }
        if cli.fresh_connections {
            config.connection_mode = ConnectionMode::Fresh;
        }
        if cli.keep_going {
            config.failure_policy = FailurePolicy::KeepGoing;
        }
        if cli.skip_ping {
            config.skip_ping = true;
        }

        config.enable_color = match cli.color_override() {
            Some(forced) => forced,
            None => config.enable_color && cli.use_colors(),
        };

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;
        config.log_level = cli.log_level;
        config.log_format = cli.log_format;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Endpoint: {}", config.endpoint));
    summary.push(format!("User Key: {}", config.masked_user_key()));
    summary.push(format!("Images: {}", config.image_urls.len()));
    summary.push(format!("Samples: {}", config.sample_count));
    summary.push(format!("Parallelism: {}", config.num_parallel));
    summary.push(format!("Connections: {}", config.connection_mode.label()));
    summary.push(format!(
        "Resize: {}",
        config
            .resize_max_dim
            .map(|d| format!("{}px", d))
            .unwrap_or_else(|| "off".to_string())
    ));
    summary.push(format!("Cache Dir: {}", config.cache_dir.display()));
    if config.save_samples {
        summary.push(format!("Output Dir: {}", config.output_dir.display()));
    } else {
        summary.push("Output Dir: (not saving)".to_string());
    }
    summary.push(format!("On Failure: {:?}", config.failure_policy));
    summary.push(format!("Color Output: {}", config.enable_color));

    summary.join("\n")
}
