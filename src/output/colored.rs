//! Colored formatter implementation with terminal color support

use super::formatter::{format_duration, FormattingOptions, OutputFormatter};
use super::RunReport;
use crate::{
    error::{AppError, Result},
    models::Sample,
    stats::LatencySummary,
    types::LatencyLevel,
};
use colored::*;
use std::fmt::Write as _;

impl LatencyLevel {
    /// Terminal color for this latency level
    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Yellow,
            Self::Slow => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Duration colored by latency level
    fn duration_colored(&self, duration_ms: f64) -> ColoredString {
        self.colorize(&format_duration(duration_ms), LatencyLevel::from_ms(duration_ms).color())
    }

    fn section_header(&self, title: &str) -> String {
        format!("{}", self.bold(title).color(self.color_scheme.header))
    }

    fn rule(&self, width: usize) -> ColoredString {
        self.colorize(&"─".repeat(width), self.color_scheme.border)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let width = title.chars().count() + 4;
        let mut output = String::new();

        writeln!(output, "{}", self.colorize(&"═".repeat(width), self.color_scheme.header)).map_err(fmt_err)?;
        writeln!(output, "  {}  ", self.bold(title)).map_err(fmt_err)?;
        write!(output, "{}", self.colorize(&"═".repeat(width), self.color_scheme.header)).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_run_summary(&self, report: &RunReport<'_>) -> Result<String> {
        let mut output = String::new();
        let label = |text: &str| self.colorize(&format!("{:<18}", text), self.color_scheme.muted);

        writeln!(output, "{}", self.section_header("Run Summary")).map_err(fmt_err)?;
        writeln!(output, "{}", self.rule(40)).map_err(fmt_err)?;
        writeln!(output, "{}{}", label("Endpoint:"), self.colorize(report.endpoint, self.color_scheme.info))
            .map_err(fmt_err)?;
        writeln!(output, "{}{}", label("Connections:"), report.connection_mode.label()).map_err(fmt_err)?;
        for image in report.images {
            writeln!(
                output,
                "{}{} {}",
                label("Image:"),
                image.source_url,
                self.colorize(&format!("({})", report.image_detail(image)), self.color_scheme.muted)
            )
            .map_err(fmt_err)?;
        }
        writeln!(
            output,
            "{}{}",
            label("Samples:"),
            self.colorize(&report.run.samples.len().to_string(), self.color_scheme.success)
        )
        .map_err(fmt_err)?;

        let failures = report.run.failures.to_string();
        let failures = if report.run.failures > 0 {
            self.colorize(&failures, self.color_scheme.error)
        } else {
            failures.normal()
        };
        writeln!(output, "{}{}", label("Failures:"), failures).map_err(fmt_err)?;
        writeln!(output, "{}{}", label("Parallelism:"), report.num_parallel).map_err(fmt_err)?;
        writeln!(
            output,
            "{}{}",
            label("Wall Time:"),
            format_duration(report.run.wall_time.as_secs_f64() * 1000.0)
        )
        .map_err(fmt_err)?;
        write!(output, "{}{:.2} req/s", label("Throughput:"), report.run.throughput()).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_percentile_table(&self, summary: &LatencySummary) -> Result<String> {
        if summary.percentiles.is_empty() {
            return Ok(self.colorize("No percentiles requested.", self.color_scheme.muted).to_string());
        }

        let mut output = String::new();
        writeln!(output, "{}", self.section_header("Latency Percentiles")).map_err(fmt_err)?;
        writeln!(output, "{}", self.rule(40)).map_err(fmt_err)?;
        writeln!(output, "{}", self.bold(&format!("{:<12} {:>12} {:>14}", "Percentile", "Latency", "Exact")))
            .map_err(fmt_err)?;

        for p in &summary.percentiles {
            // Pad before coloring so escape codes do not skew the columns
            let rounded = format!("{:>12}", format!("{:.0}ms", p.rounded_ms()));
            let exact = format!("{:>14}", format!("{:.2}ms", p.value_ms));
            writeln!(
                output,
                "{:<12} {} {}",
                p.label(),
                self.colorize(&rounded, p.level().color()),
                self.colorize(&exact, self.color_scheme.muted)
            )
            .map_err(fmt_err)?;
        }
        write!(output, "{}", self.rule(40)).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_distribution(&self, summary: &LatencySummary) -> Result<String> {
        Ok(format!(
            "min {}  mean {}  max {}  std dev {}  (n={})",
            self.duration_colored(summary.min_ms),
            self.duration_colored(summary.mean_ms),
            self.duration_colored(summary.max_ms),
            format_duration(summary.std_dev_ms),
            summary.count
        ))
    }

    fn format_samples(&self, samples: &[Sample]) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.section_header("Samples")).map_err(fmt_err)?;
        writeln!(
            output,
            "{}",
            self.bold(&format!("{:>6}  {:<12}  {:>10}  {:>9}  {:>5}", "#", "Completed", "Latency", "Bytes", "Image"))
        )
        .map_err(fmt_err)?;

        for (i, sample) in samples.iter().enumerate() {
            let latency = format!("{:>10}", format!("{:.1}ms", sample.latency_ms()));
            writeln!(
                output,
                "{:>6}  {:<12}  {}  {:>9}  {:>5}",
                i + 1,
                sample.timestamp.format("%H:%M:%S%.3f").to_string(),
                self.colorize(&latency, LatencyLevel::from_duration(sample.latency).color()),
                sample.payload_bytes,
                sample.image_index
            )
            .map_err(fmt_err)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✗", self.color_scheme.error), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success), self.colorize(message, self.color_scheme.success)))
    }
}
