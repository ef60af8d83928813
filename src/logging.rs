//! Structured logging for the latency harness
//!
//! Provides leveled, structured log entries with a per-run session id,
//! console/JSON/compact renderings and small domain loggers for the
//! recognition client and the sampler.

use crate::error::{AppError, Result};
use crate::models::{Config, Sample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that emitted the entry
    pub logger: String,
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(AppError::parse(format!("Invalid log format: {}", s))),
        }
    }
}

#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
}

/// Logger with a minimum level and an output format
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a logger at Info level with console output
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger whose level and format follow the run configuration
    ///
    /// Warn by default, Info with `--verbose`, Debug as JSON with `--debug`.
    /// An explicit `--log-level` or `--log-format` wins over both.
    pub fn with_config(name: String, config: &Config) -> Self {
        let default_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };
        let default_format = if config.debug { LogFormat::Json } else { LogFormat::Console };

        let mut logger = Self::new(name);
        logger.set_level(config.log_level.unwrap_or(default_level));
        logger.set_format(config.log_format.unwrap_or(default_format));
        logger.set_color(config.enable_color);
        logger.include_location = config.debug;
        logger
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Start an entry, recording the calling source line
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        let caller = std::panic::Location::caller();
        LogEntryBuilder::new(self, level, message.to_string()).location(caller.file(), caller.line())
    }

    #[track_caller]
    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    #[track_caller]
    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    #[track_caller]
    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    #[track_caller]
    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    #[track_caller]
    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        drop(context);

        let output = self.render(&entry);

        // Warnings and errors go to stderr so stdout stays a clean report
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry
                .fields
                .iter()
                .filter(|(k, _)| k.as_str() != "session_id")
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            if !fields.is_empty() {
                output.push_str(&format!(" {{{}}}", fields.join(", ")));
            }
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        let stripped;
        let entry = if self.include_location || entry.location.is_none() {
            entry
        } else {
            stripped = LogEntry { location: None, ..entry.clone() };
            &stripped
        };
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": {:?}}}", entry.message),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder for a single log entry
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    fn location(mut self, file: &str, line: u32) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
        });
        self
    }

    /// Attach the measurements of one sample
    pub fn sample(self, sample: &Sample) -> Self {
        self.field("latency_ms", sample.latency_ms())
            .field("payload_bytes", sample.payload_bytes)
            .field("image_index", sample.image_index)
            .field("completed_at", sample.timestamp.timestamp())
    }

    /// Attach error classification
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_transient", error.is_transient())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for HTTP traffic with the recognition service
pub struct ClientLogger {
    logger: Logger,
}

impl ClientLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("CLIENT".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log the connectivity check against the endpoint root
    pub async fn log_ping(&self, endpoint: &str, result: &Result<String>) {
        match result {
            Ok(body) => {
                self.logger
                    .info(&format!("Endpoint {} is reachable", endpoint))
                    .field("endpoint", endpoint)
                    .field("preview", body)
                    .log()
                    .await
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Ping of {} failed: {}", endpoint, e))
                    .field("endpoint", endpoint)
                    .error_info(e)
                    .log()
                    .await
            }
        }
    }

    /// Log one recognition call
    pub async fn log_recognition(&self, url: &str, payload_bytes: usize, elapsed: Duration, success: bool) {
        let level = if success { LogLevel::Debug } else { LogLevel::Warn };
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let message = format!(
            "POST {} ({} bytes) -> {} in {:.1}ms",
            url,
            payload_bytes,
            if success { "ok" } else { "FAILED" },
            elapsed_ms
        );

        self.logger
            .log(level, &message)
            .field("payload_bytes", payload_bytes)
            .field("duration_ms", elapsed_ms)
            .field("success", success)
            .log()
            .await;
    }
}

/// Logger for the sampling run
pub struct SamplerLogger {
    logger: Logger,
}

impl SamplerLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("SAMPLER".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn log_start(&self, sample_count: u32, num_parallel: usize, image_count: usize) {
        self.logger
            .info(&format!(
                "Starting {} samples with {} workers over {} image(s)",
                sample_count, num_parallel, image_count
            ))
            .field("sample_count", sample_count)
            .field("num_parallel", num_parallel)
            .field("image_count", image_count)
            .log()
            .await;
    }

    pub async fn log_sample(&self, sequence: usize, sample: &Sample) {
        self.logger
            .debug(&format!("Sample {} took {:.1}ms", sequence, sample.latency_ms()))
            .field("sequence", sequence)
            .sample(sample)
            .log()
            .await;
    }

    pub async fn log_failure(&self, sequence: usize, error: &AppError) {
        self.logger
            .warn(&format!("Sample {} failed: {}", sequence, error))
            .field("sequence", sequence)
            .error_info(error)
            .log()
            .await;
    }

    pub async fn log_complete(&self, samples: usize, failures: usize, wall_time: Duration) {
        self.logger
            .info(&format!(
                "Collected {} samples ({} failed) in {:.3}s",
                samples,
                failures,
                wall_time.as_secs_f64()
            ))
            .field("samples", samples)
            .field("failures", failures)
            .field("wall_time_seconds", wall_time.as_secs_f64())
            .log()
            .await;
    }
}

/// Creates loggers that share one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_client_logger(&self) -> ClientLogger {
        let client_logger = ClientLogger::new(&self.config);
        client_logger.logger.set_session_id(self.session_id.clone()).await;
        client_logger
    }

    pub async fn create_sampler_logger(&self) -> SamplerLogger {
        let sampler_logger = SamplerLogger::new(&self.config);
        sampler_logger.logger.set_session_id(self.session_id.clone()).await;
        sampler_logger
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::path::PathBuf;

    fn entry(level: LogLevel) -> LogEntry {
        let mut fields = HashMap::new();
        fields.insert("key".to_string(), serde_json::Value::String("value".to_string()));
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: "Test message".to_string(),
            logger: "TEST".to_string(),
            fields,
            location: None,
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_levels_follow_config() {
        let quiet = Logger::with_config("T".to_string(), &Config::default());
        assert_eq!(quiet.min_level, LogLevel::Warn);
        assert_eq!(quiet.format, LogFormat::Console);

        let verbose = Logger::with_config("T".to_string(), &Config { verbose: true, ..Default::default() });
        assert_eq!(verbose.min_level, LogLevel::Info);

        let debug = Logger::with_config(
            "T".to_string(),
            &Config { debug: true, enable_color: false, ..Default::default() },
        );
        assert_eq!(debug.min_level, LogLevel::Debug);
        assert_eq!(debug.format, LogFormat::Json);
        assert!(debug.include_location);
        assert!(!debug.use_color);
    }

    #[test]
    fn test_explicit_level_and_format_win() {
        let config = Config {
            debug: true,
            log_level: Some(LogLevel::Error),
            log_format: Some(LogFormat::Compact),
            ..Default::default()
        };
        let logger = Logger::with_config("T".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Error);
        assert_eq!(logger.format, LogFormat::Compact);

        let rendered = logger.render(&entry(LogLevel::Error));
        assert!(rendered.ends_with("E TEST: Test message"), "{}", rendered);
    }

    #[test]
    fn test_entries_record_caller() {
        let logger = Logger::new("TEST".to_string());
        let expected_line = line!() + 1;
        let builder = logger.info("here");

        let location = builder.entry.location.clone().unwrap();
        assert_eq!(location.line, expected_line);
        assert!(PathBuf::from(&location.file).ends_with("logging.rs"));

        // Location only appears in JSON when enabled
        let json: serde_json::Value = serde_json::from_str(&logger.format_json(&builder.entry)).unwrap();
        assert!(json["location"].is_null());
    }

    #[test]
    fn test_would_log() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_level(LogLevel::Warn);

        assert!(!logger.would_log(LogLevel::Debug));
        assert!(!logger.would_log(LogLevel::Info));
        assert!(logger.would_log(LogLevel::Warn));
        assert!(logger.would_log(LogLevel::Error));
    }

    #[tokio::test]
    async fn test_session_id() {
        let logger = Logger::new("TEST".to_string());
        logger.set_session_id("run-1".to_string()).await;

        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some("run-1"));
    }

    #[test]
    fn test_log_formats() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_color(false);
        let entry = entry(LogLevel::Info);

        let console = logger.format_console(&entry);
        assert!(console.contains(" INFO [TEST] Test message"));
        assert!(console.contains("key=\"value\""));

        let json = logger.format_json(&entry);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["message"], "Test message");
        assert_eq!(parsed["level"], "Info");

        logger.set_format(LogFormat::Compact);
        assert!(logger.render(&entry).ends_with("I TEST: Test message"));
    }

    #[test]
    fn test_sample_fields() {
        let logger = Logger::new("SAMPLER".to_string());
        let sample = Sample::new(Duration::from_millis(250), 4096, 2);

        let builder = logger.debug("sample").sample(&sample);
        assert_eq!(builder.entry.fields["latency_ms"], serde_json::json!(250.0));
        assert_eq!(builder.entry.fields["payload_bytes"], serde_json::json!(4096));
        assert_eq!(builder.entry.fields["image_index"], serde_json::json!(2));
    }

    #[test]
    fn test_error_info_fields() {
        let logger = Logger::new("CLIENT".to_string());
        let error = AppError::recognition("missing is_food");

        let builder = logger.warn("failed").error_info(&error);
        assert_eq!(builder.entry.fields["error_category"], serde_json::json!("RECOGNITION"));
        assert_eq!(builder.entry.fields["error_exit_code"], serde_json::json!(error.exit_code()));
    }

    #[tokio::test]
    async fn test_factory_shares_session() {
        let factory = LoggerFactory::new(Config::default());
        let sampler = factory.create_sampler_logger().await;
        let client = factory.create_client_logger().await;

        assert_eq!(sampler.logger().name(), "SAMPLER");
        assert_eq!(client.logger().name(), "CLIENT");

        let sampler_ctx = sampler.logger().context.read().await;
        let client_ctx = client.logger().context.read().await;
        assert_eq!(sampler_ctx.session_id.as_deref(), Some(factory.session_id()));
        assert_eq!(client_ctx.session_id, sampler_ctx.session_id);
    }

    #[tokio::test]
    async fn test_domain_loggers_do_not_panic() {
        let config = Config::default();
        let sampler = SamplerLogger::new(&config);
        let client = ClientLogger::new(&config);
        let sample = Sample::new(Duration::from_millis(12), 10, 0);

        sampler.log_start(10, 2, 1).await;
        sampler.log_sample(1, &sample).await;
        sampler.log_failure(2, &AppError::network("refused")).await;
        sampler.log_complete(9, 1, Duration::from_secs(1)).await;

        client.log_ping("http://localhost/", &Ok("hello".to_string())).await;
        client.log_recognition("http://localhost/v1", 10, Duration::from_millis(5), true).await;
    }
}
