//! FoodAI Latency - Main CLI Application
//!
//! Times recognition calls against the FoodAI API from a pool of parallel
//! workers and reports latency percentiles.

use clap::Parser;
use foodai_latency::{
    cli::Cli,
    client::{FoodAiClient, RecognitionClient},
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, Result},
    models::Config,
    images::{prepare_images, ImageCache},
    logging::LoggerFactory,
    output::{format_bytes, OutputCoordinator, RunReport, SampleWriter},
    sampler::Sampler,
    stats::LatencySummary,
    BUILD_TIME, GIT_COMMIT, PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Worker panics unwind into their task and surface as internal errors
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
    }));

    let cli = Cli::parse();

    // Until the configuration is loaded only the flags and terminal decide
    let cli_color = cli.use_colors();
    let (config, clear_cache) = match prepare(cli) {
        Ok(Some(prepared)) => prepared,
        Ok(None) => return,
        Err(e) => exit_with_error(&e, cli_color),
    };

    if let Err(e) = run_application(&config, clear_cache).await {
        exit_with_error(&e, config.enable_color);
    }
}

fn exit_with_error(error: &AppError, use_color: bool) -> ! {
    eprintln!("{}", error.format_for_console(use_color));

    // Print suggestions for common errors
    print_error_suggestions(error);

    process::exit(error.exit_code());
}

/// Handle the informational flags, then load the configuration
///
/// Returns `None` when the invocation is complete without a run.
fn prepare(cli: Cli) -> Result<Option<(Config, bool)>> {
    if cli.debug {
        println!("{} v{} ({}, built {})", PKG_NAME, VERSION, GIT_COMMIT, BUILD_TIME);
        println!("Debug mode enabled");
        println!();
    }

    if cli.env_help {
        print!("{}", EnvManager::display_env_help());
        return Ok(None);
    }

    if let Some(path) = &cli.write_env_example {
        EnvManager::save_example_env_file(path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(None);
    }

    let clear_cache = cli.clear_cache;
    let config = load_config(cli)?;
    Ok(Some((config, clear_cache)))
}

/// Main application logic
async fn run_application(config: &Config, clear_cache: bool) -> Result<()> {
    if config.debug {
        println!("Configuration loaded successfully:");
        for line in display_config_summary(config).lines() {
            println!("  {}", line);
        }
        for warning in EnvManager::validate_current_env() {
            println!("  {}", warning);
        }
        println!();
    }

    let loggers = LoggerFactory::new(config.clone());
    let app_logger = loggers.create_logger("APP").await;
    app_logger
        .info("Run configured")
        .field("endpoint", &config.endpoint)
        .field("samples", config.sample_count)
        .field("parallel", config.num_parallel)
        .field("connections", config.connection_mode.label())
        .log()
        .await;
    let coordinator = OutputCoordinator::from_config(config);
    let formatter = coordinator.formatter();

    let client = Arc::new(
        FoodAiClient::from_config(config)?.with_logger(loggers.create_client_logger().await),
    );

    println!("Endpoint: {}", config.endpoint);
    if !config.skip_ping {
        let preview = client.ping().await?;
        println!("Ping: {}", preview);
    }

    if clear_cache {
        let removed = ImageCache::new(&config.cache_dir).clear().await?;
        println!(
            "{}",
            formatter.format_success(&format!("Removed {} cached image(s)", removed))?
        );
    }

    let image_logger = loggers.create_logger("IMAGES").await;
    let images = prepare_images(config, &image_logger).await?;
    for image in &images {
        println!("Image: {} ({})", image.source_url, format_bytes(image.payload_bytes()));
    }

    if config.verbose || config.debug {
        println!(
            "Taking {} samples with {} parallel workers ({})...",
            config.sample_count,
            config.num_parallel,
            config.connection_mode.label()
        );
    }
    println!();

    let sampler = Sampler::new(client.clone(), config).with_logger(loggers.create_sampler_logger().await);
    let run = sampler.run(&images).await?;

    let summary = LatencySummary::from_samples(&run.samples, &config.percentiles)?;
    let report = RunReport::new(config, &images, &run, &summary);
    println!("{}", coordinator.render_report(&report)?);

    if run.failures > 0 {
        println!();
        println!(
            "{}",
            formatter.format_warning(&format!("{} of {} calls failed", run.failures, run.attempted()))?
        );
    }

    if config.save_samples {
        let path = SampleWriter::new(&config.output_dir)
            .write(&config.endpoint, &run.samples)
            .await?;
        app_logger
            .info("Samples saved")
            .field("path", &path)
            .field("lines", run.samples.len())
            .log()
            .await;
        println!();
        println!(
            "{}",
            formatter.format_success(&format!("Samples written to {}", path.display()))?
        );
    }

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Set USER_KEY in the environment or a .env file, or pass --user-key");
            eprintln!("  - Endpoint and image URLs must start with http:// or https://");
            eprintln!("  - Run with --help to see every option");
        }
        AppError::Network(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check that the endpoint is reachable");
            eprintln!("  - Verify firewall and proxy settings");
            eprintln!("  - Lower --parallel if the service refuses connections");
        }
        AppError::HttpRequest(_) | AppError::Recognition(_) => {
            eprintln!();
            eprintln!("Request troubleshooting:");
            eprintln!("  - Check that the user key is valid for this endpoint");
            eprintln!("  - Use --keep-going to record failures instead of stopping");
            eprintln!("  - Run with --debug to log every request");
        }
        AppError::Image(_) | AppError::Cache(_) => {
            eprintln!();
            eprintln!("Image troubleshooting:");
            eprintln!("  - Make sure the image URLs point to JPEG or PNG files");
            eprintln!("  - Retry with --clear-cache to download the images again");
        }
        _ => {}
    }
}
