//! Report formatting and the sample file
//!
//! The console report is rendered through an `OutputFormatter`, plain or
//! colored, and raw samples are written to a flat text file.

mod colored;
mod formatter;
mod sample_file;

pub use colored::{ColorScheme, ColoredFormatter};
pub use formatter::{
    format_bytes, format_duration, Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter,
    RowData, TableFormat,
};
pub use sample_file::{render_samples, sample_file_name, sanitize, SampleWriter};

use crate::{
    error::Result,
    models::{Config, SampleImage},
    sampler::SamplingRun,
    stats::LatencySummary,
    types::ConnectionMode,
};

/// Everything the report shows about one run
pub struct RunReport<'a> {
    pub endpoint: &'a str,
    pub connection_mode: ConnectionMode,
    pub num_parallel: usize,
    pub images: &'a [SampleImage],
    pub run: &'a SamplingRun,
    pub summary: &'a LatencySummary,
}

impl<'a> RunReport<'a> {
    pub fn new(
        config: &'a Config,
        images: &'a [SampleImage],
        run: &'a SamplingRun,
        summary: &'a LatencySummary,
    ) -> Self {
        Self {
            endpoint: &config.endpoint,
            connection_mode: config.connection_mode,
            num_parallel: config.num_parallel,
            images,
            run,
            summary,
        }
    }

    /// Size, and resize details when the image was downscaled
    pub fn image_detail(&self, image: &SampleImage) -> String {
        match image.dimensions {
            Some((width, height)) => format!(
                "{} -> {}, {}x{}",
                format_bytes(image.original_bytes),
                format_bytes(image.payload_bytes()),
                width,
                height
            ),
            None => format_bytes(image.payload_bytes()),
        }
    }
}

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    pub fn create_formatter(enable_color: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Plain text formatter for scripts and logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false)
    }
}

/// Assembles the full console report
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
    verbose: bool,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>, verbose: bool) -> Self {
        Self { formatter, verbose }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OutputFormatterFactory::create_formatter(config.enable_color),
            config.verbose,
        )
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Header, run summary, percentile table, distribution and, when verbose, every sample
    pub fn render_report(&self, report: &RunReport<'_>) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.formatter.format_header("FoodAI Latency Results")?);
        output.push_str("\n\n");

        output.push_str(&self.formatter.format_run_summary(report)?);
        output.push_str("\n\n");

        output.push_str(&self.formatter.format_percentile_table(report.summary)?);
        output.push_str("\n\n");

        output.push_str(&self.formatter.format_distribution(report.summary)?);

        if self.verbose {
            output.push_str("\n\n");
            output.push_str(&self.formatter.format_samples(&report.run.samples)?);
        }

        Ok(output)
    }
}
