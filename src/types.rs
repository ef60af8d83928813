//! Type definitions shared across the harness

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// How the recognition client manages HTTP connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionMode {
    /// One pooled client shared by every worker (keep-alive connections)
    #[default]
    Persistent,
    /// A new client, and therefore a new connection, for every request
    Fresh,
}

impl ConnectionMode {
    /// Human readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionMode::Persistent => "persistent",
            ConnectionMode::Fresh => "fresh",
        }
    }
}

/// What the sampling loop does when a recognition call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failure
    #[default]
    FailFast,
    /// Drop the failed sample, count it, keep going
    KeepGoing,
}

/// Latency classification used for colouring output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyLevel {
    /// Under 500ms
    Fast,
    /// 500ms to 1.5s
    Moderate,
    /// Over 1.5s
    Slow,
}

impl LatencyLevel {
    /// Classify a latency in milliseconds
    pub fn from_ms(latency_ms: f64) -> Self {
        if latency_ms < 500.0 {
            Self::Fast
        } else if latency_ms < 1500.0 {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    /// Classify a duration
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_ms(duration.as_secs_f64() * 1000.0)
    }
}
