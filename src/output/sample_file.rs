//! Flat text file of raw samples

use crate::{
    error::{AppError, Result},
    models::Sample,
};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Make an endpoint URL usable inside a file name
///
/// Separators are replaced with `_` and doubled underscores collapsed; the
/// pass runs three times so runs of separators fully collapse.
pub fn sanitize(name: &str) -> String {
    let mut sanitized = name.to_string();
    for _ in 0..3 {
        for pattern in ["//", "/", ".", ":", "__"] {
            sanitized = sanitized.replace(pattern, "_");
        }
    }
    sanitized
}

/// `latency_<sanitized endpoint><YYYYmmdd-HHMMSS>.txt`
pub fn sample_file_name(endpoint: &str, at: DateTime<Local>) -> String {
    format!("latency_{}{}.txt", sanitize(endpoint), at.format("%Y%m%d-%H%M%S"))
}

/// One `<unix_seconds> <latency_ms> <payload_bytes>` line per sample
pub fn render_samples(samples: &[Sample]) -> String {
    let mut out = String::with_capacity(samples.len() * 24);
    for sample in samples {
        out.push_str(&sample.to_line());
        out.push('\n');
    }
    out
}

/// Writes sample files into an output directory
#[derive(Debug, Clone)]
pub struct SampleWriter {
    dir: PathBuf,
}

impl SampleWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the samples of a run that just finished
    pub async fn write(&self, endpoint: &str, samples: &[Sample]) -> Result<PathBuf> {
        self.write_at(endpoint, samples, Local::now()).await
    }

    pub async fn write_at(&self, endpoint: &str, samples: &[Sample], at: DateTime<Local>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::io(format!("Failed to create output directory {}: {}", self.dir.display(), e))
        })?;

        let path = self.dir.join(sample_file_name(endpoint, at));
        tokio::fs::write(&path, render_samples(samples))
            .await
            .map_err(|e| AppError::io(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(path)
    }
}
