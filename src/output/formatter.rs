//! Core formatting traits and the plain text implementation

use super::RunReport;
use crate::{
    error::{AppError, Result},
    models::Sample,
    stats::LatencySummary,
};
use std::fmt::Write as _;

/// Renders the parts of a latency report
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Endpoint, workload and throughput of the run
    fn format_run_summary(&self, report: &RunReport<'_>) -> Result<String>;

    /// One row per requested percentile
    fn format_percentile_table(&self, summary: &LatencySummary) -> Result<String>;

    /// Min, mean, max and standard deviation
    fn format_distribution(&self, summary: &LatencySummary) -> Result<String>;

    /// Per-sample listing in completion order
    fn format_samples(&self, samples: &[Sample]) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width: 4,
            max_width: 60,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Human-readable duration
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.2}μs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        if rows.is_empty() {
            return Ok(String::new());
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &column_widths, format));
            output.push('\n');

            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &column_widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        Ok(output.trim_end_matches('\n').to_string())
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let num_columns = format
            .columns
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..num_columns)
            .map(|col_idx| {
                let column = format.columns.get(col_idx);
                let mut width = column
                    .map(|c| c.min_width.max(c.header.chars().count()))
                    .unwrap_or(4);

                for row in rows {
                    if let Some(cell) = row.get(col_idx) {
                        width = width.max(cell.chars().count());
                    }
                }

                column.map(|c| width.min(c.max_width)).unwrap_or(width)
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(idx)
                .map(|c| &c.alignment)
                .unwrap_or(&Alignment::Left);

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&self.align_text(cell, width, alignment));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();

        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }

        border
    }

    /// Align text within specified width
    pub(crate) fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                let right_pad = padding - left_pad;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
            }
        }
    }

    pub(crate) fn percentile_format(&self) -> TableFormat {
        TableFormat {
            columns: vec![
                Column::new("Percentile", Alignment::Left),
                Column::new("Latency", Alignment::Right),
                Column::new("Exact", Alignment::Right),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        }
    }

    pub(crate) fn percentile_rows(&self, summary: &LatencySummary) -> Vec<RowData> {
        summary
            .percentiles
            .iter()
            .map(|p| {
                vec![
                    p.label(),
                    format!("{:.0}ms", p.rounded_ms()),
                    format!("{:.2}ms", p.value_ms),
                ]
            })
            .collect()
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);

        writeln!(output, "{}", border).map_err(fmt_err)?;
        writeln!(output, "  {}  ", title).map_err(fmt_err)?;
        write!(output, "{}", border).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_run_summary(&self, report: &RunReport<'_>) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Run Summary:").map_err(fmt_err)?;
        writeln!(output, "------------").map_err(fmt_err)?;
        writeln!(output, "Endpoint:         {}", report.endpoint).map_err(fmt_err)?;
        writeln!(output, "Connections:      {}", report.connection_mode.label()).map_err(fmt_err)?;
        for image in report.images {
            writeln!(output, "Image:            {} ({})", image.source_url, report.image_detail(image))
                .map_err(fmt_err)?;
        }
        writeln!(output, "Samples:          {}", report.run.samples.len()).map_err(fmt_err)?;
        writeln!(output, "Failures:         {}", report.run.failures).map_err(fmt_err)?;
        writeln!(output, "Parallelism:      {}", report.num_parallel).map_err(fmt_err)?;
        writeln!(
            output,
            "Wall Time:        {}",
            format_duration(report.run.wall_time.as_secs_f64() * 1000.0)
        )
        .map_err(fmt_err)?;
        write!(output, "Throughput:       {:.2} req/s", report.run.throughput()).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_percentile_table(&self, summary: &LatencySummary) -> Result<String> {
        if summary.percentiles.is_empty() {
            return Ok("No percentiles requested.".to_string());
        }

        self.create_table(&self.percentile_format(), &self.percentile_rows(summary))
    }

    fn format_distribution(&self, summary: &LatencySummary) -> Result<String> {
        Ok(format!(
            "min {}  mean {}  max {}  std dev {}  (n={})",
            format_duration(summary.min_ms),
            format_duration(summary.mean_ms),
            format_duration(summary.max_ms),
            format_duration(summary.std_dev_ms),
            summary.count
        ))
    }

    fn format_samples(&self, samples: &[Sample]) -> Result<String> {
        let format = TableFormat {
            columns: vec![
                Column::new("#", Alignment::Right),
                Column::new("Completed", Alignment::Left),
                Column::new("Latency", Alignment::Right),
                Column::new("Bytes", Alignment::Right),
                Column::new("Image", Alignment::Right),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        };

        let rows: Vec<RowData> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                vec![
                    (i + 1).to_string(),
                    s.timestamp.format("%H:%M:%S%.3f").to_string(),
                    format!("{:.1}ms", s.latency_ms()),
                    s.payload_bytes.to_string(),
                    s.image_index.to_string(),
                ]
            })
            .collect();

        self.create_table(&format, &rows)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}
